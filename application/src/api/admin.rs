//! Administrator session endpoints.

use std::collections::BTreeSet;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use service::{
    command::{Command as _, LogAdminActivity},
    domain::{
        admin,
        user::{self, session, Role},
    },
};
use tracing as log;

use crate::{AsError, Context, Error};

/// Administrator session as exposed to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// ID of the administrator.
    pub id: user::Id,

    /// Email of the administrator.
    pub email: user::Email,

    /// [`Role`] of the administrator.
    pub role: Role,

    /// Granted permissions.
    pub permissions: BTreeSet<String>,

    /// First name of the administrator.
    pub first_name: String,

    /// Last name of the administrator.
    pub last_name: String,

    /// Indicator whether the administrator account is active.
    pub is_active: bool,

    /// Unix timestamp of the last sign-in.
    pub last_login_at: i64,

    /// Indicator whether the administrator is a super-administrator.
    pub is_super_admin: bool,
}

impl From<&admin::Session> for Session {
    fn from(session: &admin::Session) -> Self {
        Self {
            id: session.id.clone(),
            email: session.email.clone(),
            role: session.role,
            permissions: session.permissions.clone(),
            first_name: session.first_name.clone(),
            last_name: session.last_name.clone(),
            is_active: session.is_active,
            last_login_at: session.last_login_at.unix_timestamp(),
            is_super_admin: session.is_super_admin,
        }
    }
}

/// Activity reported by an administrator.
#[derive(Debug, Deserialize)]
pub struct Activity {
    /// Performed action.
    pub action: String,

    /// Free-form details of the action.
    #[serde(default)]
    pub details: String,
}

/// Records the provided `action` on behalf of the administrator.
async fn record(
    context: &Context,
    user_id: user::Id,
    action: impl Into<String>,
    details: String,
) {
    let Ok(()) = context
        .service()
        .execute(LogAdminActivity {
            user_id,
            action: action.into(),
            details,
        })
        .await;
}

/// `GET /api/admin/session`: returns the current administrator session.
///
/// # Errors
///
/// Errors with `401 Unauthorized` if no valid administrator session is
/// presented.
pub async fn get_session(context: Context) -> Result<Json<Session>, Error> {
    let session = context.admin_session().await?;
    record(&context, session.id.clone(), "session.view", String::new()).await;
    Ok(Json(session.into()))
}

/// `DELETE /api/admin/session`: clears the administrator session cookie.
pub async fn sign_out(context: Context) -> (CookieJar, StatusCode) {
    if let Some(session) = context.try_admin_session().await {
        log::info!("administrator `{}` signed out", session.id);
        record(&context, session.id.clone(), "session.sign_out", String::new())
            .await;
    }
    let jar = context
        .transport()
        .clear(CookieJar::new(), session::Kind::Admin);
    (jar, StatusCode::NO_CONTENT)
}

/// `POST /api/admin/activity`: records an activity of the administrator.
///
/// # Errors
///
/// Errors with:
/// - `401 Unauthorized` if no valid administrator session is presented;
/// - `403 Forbidden` if the session may not manage administrators;
/// - `4xx` if the request body is malformed.
pub async fn log_activity(
    context: Context,
    payload: Result<Json<Activity>, JsonRejection>,
) -> Result<StatusCode, Error> {
    let session = context.admin_manager().await?;
    let Json(Activity { action, details }) =
        payload.map_err(AsError::into_error)?;

    record(&context, session.id.clone(), action, details).await;
    Ok(StatusCode::ACCEPTED)
}
