//! HTTP handlers for the batch inventory server

pub mod batch;
pub mod health;
pub mod notification;
pub mod stock;
pub mod transfer;

pub use batch::*;
pub use health::*;
pub use notification::*;
pub use stock::*;
pub use transfer::*;
