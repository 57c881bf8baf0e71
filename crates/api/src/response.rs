//! Shared response envelope types for API handlers.
//!
//! Every successful response uses a `{ "data": ... }` envelope. Errors use
//! `{ "error": ..., "code": ... }` (see [`crate::error::AppError`]).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: receipt }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
