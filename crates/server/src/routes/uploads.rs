//! Receipt photo upload and removal.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tokoledger_core::ExpenseId;

use super::{ApiJson, ApiQuery, required_id, required_text};
use crate::error::AppError;
use crate::models::Expense;
use crate::services::UploadedFile;
use crate::state::AppState;

/// Build the uploads router. `body_limit` caps the whole multipart request.
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new().route(
        "/uploads",
        post(upload_files)
            .delete(delete_file)
            .layer(DefaultBodyLimit::max(body_limit)),
    )
}

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub paths: Vec<String>,
}

/// Selector for the attachment to remove.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileQuery {
    pub expense_id: Option<String>,
    pub image_path: Option<String>,
}

/// Response for a removed attachment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub message: String,
    pub updated_expense: Expense,
}

/// Accept `files` parts and a `folderId` field, then store the files under
/// that folder.
#[instrument(skip(state, multipart))]
async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiJson<UploadResponse>, AppError> {
    let mut multipart = multipart?;
    let mut folder_id: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("folderId") => folder_id = Some(field.text().await?),
            Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?.to_vec();
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => tracing::debug!(field = ?other, "Ignoring unknown multipart field"),
        }
    }

    let folder_id = required_text(folder_id.as_deref(), "folderId")?;
    let paths = state.attachments().save(folder_id, files).await?;

    Ok(ApiJson(UploadResponse {
        message: "Files uploaded successfully".to_owned(),
        paths,
    }))
}

/// Delete one attachment file and drop it from its expense.
#[instrument(skip(state))]
async fn delete_file(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeleteFileQuery>,
) -> Result<ApiJson<DeleteFileResponse>, AppError> {
    let expense_id: ExpenseId = required_id(query.expense_id.as_deref(), "expenseId")?;
    let image_path = required_text(query.image_path.as_deref(), "imagePath")?;

    let updated_expense = state
        .expenses()
        .remove_attachment(expense_id, image_path)
        .await?;

    Ok(ApiJson(DeleteFileResponse {
        message: "File deleted successfully".to_owned(),
        updated_expense,
    }))
}
