//! DTOs for the Depot Web API.

pub mod request;
pub mod response;
pub mod validation;

pub use request::UploadRequest;
pub use response::FileResponse;
