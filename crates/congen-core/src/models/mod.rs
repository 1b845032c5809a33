pub mod job;
pub mod response;
pub mod service;
pub mod tone;

pub use job::{GenerateFileParams, GeneratePromptRequest, GenerationJob};
pub use response::{ErrorCode, ResponseBase, SaveFileResponse, ServiceListResponse};
pub use service::{ServiceEntry, ServiceType};
pub use tone::Tone;
