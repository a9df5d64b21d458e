//! User session endpoints.

use axum::{http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use service::domain::{
    user::{self, session},
    User,
};

use crate::{Context, Error};

/// User session as exposed to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// [`User`] the session belongs to.
    pub user: User,

    /// Unix timestamp of the session issuance.
    pub issued_at: i64,

    /// Unix timestamp of the session expiration.
    pub expires_at: i64,
}

impl From<&user::Session> for Session {
    fn from(session: &user::Session) -> Self {
        Self {
            user: session.user().clone(),
            issued_at: session.claims().issued_at.unix_timestamp(),
            expires_at: session.expires_at().unix_timestamp(),
        }
    }
}

/// `GET /api/auth/session`: returns the current user session.
///
/// # Errors
///
/// Errors with `401 Unauthorized` if no valid user session is presented.
pub async fn get_session(context: Context) -> Result<Json<Session>, Error> {
    let session = context.current_session().await?;
    Ok(Json(session.into()))
}

/// `DELETE /api/auth/session`: clears the user session cookie.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn sign_out(context: Context) -> (CookieJar, StatusCode) {
    let jar = context
        .transport()
        .clear(CookieJar::new(), session::Kind::User);
    (jar, StatusCode::NO_CONTENT)
}
