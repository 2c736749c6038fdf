//! Request DTOs for the Depot Web API.

use validator::Validate;

use crate::web::dto::validation::no_control_chars;

/// Metadata of a multipart upload, validated before the storage layer sees
/// the bytes.
#[derive(Debug, Validate)]
pub struct UploadRequest {
    /// The user-supplied filename of the `file` part.
    #[validate(
        length(min = 1, max = 255, message = "Filename length is invalid"),
        custom(function = "no_control_chars")
    )]
    pub original_name: String,

    /// Optional free-text description.
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: Option<String>,
}
