pub mod catalog;
pub mod orchestrator;

pub use catalog::ServiceCatalog;
pub use orchestrator::{FileSlot, Orchestrator, UploadedFile};
