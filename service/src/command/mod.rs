//! [`Command`] definition.

pub mod authorize_admin_session;
pub mod authorize_route;
pub mod authorize_user_session;
pub mod issue_user_session;
pub mod log_admin_activity;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_admin_session::AuthorizeAdminSession,
    authorize_route::AuthorizeRoute,
    authorize_user_session::AuthorizeUserSession,
    issue_user_session::IssueUserSession,
    log_admin_activity::LogAdminActivity,
};
