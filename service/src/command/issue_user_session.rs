//! [`Command`] for issuing a [`Session`].

use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Session;
use crate::{
    domain::user::session::{self, Claims, Payload},
    Service,
};

use super::Command;

/// [`Command`] for issuing a [`Session`] [`session::Token`].
///
/// Credentials are not checked here: the caller is expected to have
/// authenticated the [`Claims::user`] already.
#[derive(Clone, Debug, From)]
pub struct IssueUserSession {
    /// [`Claims`] to sign.
    ///
    /// The [`Session`] expires [`Session::TTL`] after
    /// [`Claims::issued_at`].
    pub claims: Claims,
}

/// Output of [`IssueUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Signed [`session::Token`].
    pub token: session::Token,

    /// [`DateTime`] when the issued [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<A> Command<IssueUserSession> for Service<A> {
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: IssueUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IssueUserSession { claims } = cmd;

        let jwt = self
            .config()
            .jwt
            .as_ref()
            .ok_or_else(|| tracerr::new!(E::ConfigurationMissing))?;

        let payload = Payload::new(claims);
        let expires_at = payload.expires_at;
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &payload,
            &jwt.encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token: token.into(),
            expires_at,
        })
    }
}

/// Error of [`IssueUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// No signing secret is configured.
    #[display("No session signing secret is configured")]
    ConfigurationMissing,

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),
}
