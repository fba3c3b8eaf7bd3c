//! Shared domain logic for the Warehouse Inventory Tracker
//!
//! This crate contains the pure, database-free parts of the system: the
//! stock-intake reconciliation math, input validation, and small types
//! shared between the backend services.

pub mod stock;
pub mod types;
pub mod validation;

pub use stock::*;
pub use types::*;
pub use validation::*;
