//! Business logic services for the batch inventory server

pub mod allocation;
pub mod batch;
pub mod directory;
pub mod notification;
pub mod store;
pub mod transfer;

pub use allocation::AllocationService;
pub use batch::BatchService;
pub use directory::DirectoryService;
pub use notification::NotificationService;
pub use transfer::TransferService;
