//! Shared domain core for branch batch inventory
//!
//! This crate contains the batch registry rules, the per-batch allocation
//! ledger, transfer validation and expiration derivations. It performs no I/O
//! and is used by the backend server and, via WASM, by the dashboard.

pub mod error;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
