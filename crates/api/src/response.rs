//! Shared response envelope types for API handlers.
//!
//! Successful responses are the payload's own fields plus
//! `"success": true`. Failures are produced by [`crate::error::AppError`].

use serde::Serialize;

/// Standard `{ "success": true, ...T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(SuccessResponse::new(report)))
/// ```
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
