//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains all domain entities and request/response structures used by the API.

pub mod submission;
pub mod user;

// Re-export commonly used types
pub use submission::*;
pub use test::*;
pub use user::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
