//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::CookieJar;
use service::{
    command::{self, Command as _},
    domain::{
        admin,
        user::{self, session},
    },
};
use tokio::sync::OnceCell;

use crate::{define_error, session::Transport, Error, Service};

/// Request context.
///
/// Verifies the session cookies of a request lazily, at most once per
/// [`session::Kind`].
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Session cookie [`Transport`].
    transport: Transport,

    /// Session [`session::Token`]s presented with the request.
    tokens: session::Tokens,

    /// Verified [`session::Kind::User`] session.
    user_session: OnceCell<Option<user::Session>>,

    /// Verified [`session::Kind::Admin`] session of any role.
    admin_cookie_session: OnceCell<Option<user::Session>>,

    /// Verified administrator session.
    admin_session: OnceCell<Option<admin::Session>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the session cookie [`Transport`] of this [`Context`].
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the verified [`user::Session`] carried in the cookie of the
    /// provided [`session::Kind`], if any.
    pub async fn session(&self, kind: session::Kind) -> Option<&user::Session> {
        let cell = match kind {
            session::Kind::User => &self.user_session,
            session::Kind::Admin => &self.admin_cookie_session,
        };
        cell.get_or_init(|| async {
            let token = self.tokens.get(kind).cloned()?;
            let Ok(session) = self
                .service
                .execute(command::AuthorizeUserSession { token })
                .await;
            session
        })
        .await
        .as_ref()
    }

    /// Returns the current [`user::Session`].
    ///
    /// # Errors
    ///
    /// Errors if the request carries no valid user session.
    pub async fn current_session(&self) -> Result<&user::Session, Error> {
        self.session(session::Kind::User)
            .await
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }

    /// Returns the current [`admin::Session`], if any.
    pub async fn try_admin_session(&self) -> Option<&admin::Session> {
        self.admin_session
            .get_or_init(|| async {
                let token = self.tokens.admin.clone()?;
                let Ok(session) = self
                    .service
                    .execute(command::AuthorizeAdminSession { token })
                    .await;
                session
            })
            .await
            .as_ref()
    }

    /// Returns the current [`admin::Session`].
    ///
    /// # Errors
    ///
    /// Errors if the request carries no valid administrator session.
    pub async fn admin_session(&self) -> Result<&admin::Session, Error> {
        self.try_admin_session()
            .await
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }

    /// Returns the current [`admin::Session`] allowed to manage
    /// administrators.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the request carries no valid session in the admin cookie;
    /// - the session is valid, but not allowed to manage administrators.
    pub async fn admin_manager(&self) -> Result<&admin::Session, Error> {
        let Some(session) = self.try_admin_session().await else {
            let verified = self.session(session::Kind::Admin).await.is_some();
            return Err(if verified {
                AuthError::Forbidden
            } else {
                AuthError::Unauthenticated
            }
            .into());
        };
        if !session.can_manage_admins() {
            return Err(AuthError::Forbidden.into());
        }
        Ok(session)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let transport =
            parts.extensions.get::<Transport>().copied().ok_or_else(|| {
                Error::internal(&"missing `session::Transport` extension")
            })?;

        Ok(Self {
            service,
            transport,
            tokens: Transport::tokens(&CookieJar::from_headers(&parts.headers)),
            user_session: OnceCell::new(),
            admin_cookie_session: OnceCell::new(),
            admin_session: OnceCell::new(),
        })
    }
}

define_error! {
    enum AuthError {
        #[code = "UNAUTHENTICATED"]
        #[status = UNAUTHORIZED]
        #[message = "Authentication required"]
        Unauthenticated,

        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Insufficient permissions"]
        Forbidden,
    }
}
