//! Domain models for tokoledger.
//!
//! - [`store`] - Stores where purchases are made
//! - [`product`] - Store-scoped expense products and the sales catalog
//! - [`customer`] - Customers and their delivery addresses
//! - [`expense`] - Purchases with embedded line items
//! - [`order`] - Customer orders with embedded line items

pub mod customer;
pub mod expense;
pub mod order;
pub mod product;
pub mod store;

pub use customer::{Address, Customer, NewAddress, NewCustomer};
pub use expense::{
    Expense, ExpenseDraft, ExpenseFilter, ExpenseInput, ExpenseItem, ExpenseItemInput,
    ExpenseItemView, ExpenseView, ProductInfo, StoreInfo,
};
pub use order::{
    Order, OrderDraft, OrderFilter, OrderInput, OrderItem, OrderItemInput, OrderItemView,
    OrderView,
};
pub use product::{CatalogProduct, ExpenseProduct, NewCatalogProduct, NewExpenseProduct};
pub use store::{CreateStoreInput, NewStore, Store};
