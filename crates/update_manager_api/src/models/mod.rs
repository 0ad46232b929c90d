//! HTTP request and response models
//!
//! These types exist only in the HTTP layer. Requests are converted to core
//! types with `From` at the handler boundary; the archive catalog itself is
//! serialized directly from `update_manager_core::ArchiveCatalog`.

pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{ListArchiveQuery, SerialNumbersRequest};
pub use response::{
    HealthCheckResponse, MessageResponse, OutputFilesResponse, PipelineStartResponse,
    SerialNumberResponse, UploadDebsResponse, UploadResponse,
};
