//! Request handlers, one module per resource.
//!
//! Coarse access control happens in the gate before any handler runs; handlers
//! validate payloads, call the repository and wrap results in `ApiResponse`.

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod deliveries;
pub mod drivers;
pub mod products;
pub mod sales;
pub mod users;
