//! [`Command`] for authorizing a request to a route.

use derive_more::{Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{route::Decision, user::session::Tokens},
    Service,
};

use super::{AuthorizeUserSession, Command};

/// [`Command`] for authorizing a request to a route.
///
/// Public routes are allowed without inspecting any token. Otherwise the
/// token of the matched rule's session kind is verified and its role checked.
#[derive(Clone, Debug)]
pub struct AuthorizeRoute {
    /// Requested path, without the query string.
    pub path: String,

    /// Session tokens presented by the client.
    pub tokens: Tokens,
}

impl<A> Command<AuthorizeRoute> for Service<A> {
    type Ok = Decision;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeRoute,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeRoute { path, tokens } = cmd;
        let guard = &self.config().guard;

        let rule = guard.table.classify(&path);
        if !rule.access.requires_session() {
            return Ok(Decision::Allowed);
        }

        if self.config().jwt.is_none() {
            return Err(tracerr::new!(ExecutionError::ConfigurationMissing));
        }

        let session = match tokens.get(rule.session).cloned() {
            Some(token) => {
                let Ok(session) =
                    self.execute(AuthorizeUserSession { token }).await;
                session
            }
            None => None,
        };

        let decision = guard.decide(&path, rule, session.as_ref());
        if let Decision::Denied(denial) = &decision {
            log::debug!(
                path = %path,
                reason = ?denial.reason,
                redirect = %denial.redirect,
                "route access denied",
            );
        }
        Ok(decision)
    }
}

/// Error of [`AuthorizeRoute`] [`Command`] execution.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ExecutionError {
    /// No signing secret is configured.
    #[display("No session signing secret is configured")]
    ConfigurationMissing,
}
