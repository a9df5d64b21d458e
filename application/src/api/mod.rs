//! HTTP API definitions.

pub mod admin;
pub mod auth;

use crate::{define_error, Error};

/// Handler of paths no endpoint serves.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn not_found() -> Error {
    ApiError::NotFound.into()
}

define_error! {
    enum ApiError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Not found"]
        NotFound,
    }
}
