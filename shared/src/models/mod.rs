//! Domain models for batch inventory

mod batch;
mod directory;
mod notification;
mod stock;

pub use batch::*;
pub use directory::*;
pub use notification::*;
pub use stock::*;
