//! [`Command`] for verifying an administrator [`Session`].

use std::convert::Infallible;

use derive_more::From;

use crate::{
    domain::{admin::Session, user::session},
    Service,
};

use super::{AuthorizeUserSession, Command};

/// [`Command`] for verifying an administrator [`Session`].
///
/// Verifies the [`session::Token`] exactly as [`AuthorizeUserSession`] does
/// and additionally requires [`Role::Admin`]. Any other [`Role`] results in
/// [`None`].
///
/// [`Role`]: crate::domain::user::Role
/// [`Role::Admin`]: crate::domain::user::Role::Admin
#[derive(Clone, Debug, From)]
pub struct AuthorizeAdminSession {
    /// [`session::Token`] to verify.
    pub token: session::Token,
}

impl<A> Command<AuthorizeAdminSession> for Service<A> {
    type Ok = Option<Session>;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: AuthorizeAdminSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeAdminSession { token } = cmd;

        Ok(self
            .execute(AuthorizeUserSession { token })
            .await?
            .as_ref()
            .and_then(Session::derive))
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            authorize_user_session::spec::{service, sign, user},
            Command as _,
        },
        domain::user::{self, session::Claims, Role},
    };

    use super::AuthorizeAdminSession;

    #[tokio::test]
    async fn derives_admin_view() {
        let svc = service(());
        let claims = Claims::new(user(Role::Admin))
            .with_permissions(["forms:delete"]);
        let issued_at = claims.issued_at;
        let token = sign(&svc, claims).await;

        let session = svc
            .execute(AuthorizeAdminSession {
                token: token.as_str().into(),
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.id, user::Id::from("user-1"));
        assert_eq!(session.email, user::Email::from("ada@example.com"));
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.first_name, "Ada");
        assert_eq!(session.last_name, "Lovelace");
        assert!(session.is_active);
        assert_eq!(session.last_login_at, issued_at);
        assert!(session.permissions.contains("forms:delete"));
        assert!(!session.is_super_admin);
        assert!(session.can_manage_admins());
    }

    #[tokio::test]
    async fn requires_admin_role() {
        let svc = service(());

        for role in [Role::User, Role::SuperAdmin] {
            let token = sign(&svc, Claims::new(user(role)).super_admin()).await;
            assert!(
                svc.execute(AuthorizeAdminSession {
                    token: token.as_str().into(),
                })
                .await
                .unwrap()
                .is_none(),
                "`{role}` must not get an admin session",
            );
        }
    }

    #[tokio::test]
    async fn super_admin_requires_explicit_flag() {
        let svc = service(());

        let plain = sign(&svc, Claims::new(user(Role::Admin))).await;
        let flagged =
            sign(&svc, Claims::new(user(Role::Admin)).super_admin()).await;

        let plain = svc
            .execute(AuthorizeAdminSession {
                token: plain.as_str().into(),
            })
            .await
            .unwrap()
            .unwrap();
        let flagged = svc
            .execute(AuthorizeAdminSession {
                token: flagged.as_str().into(),
            })
            .await
            .unwrap()
            .unwrap();

        assert!(!plain.is_super_admin);
        assert!(flagged.is_super_admin);
        assert!(plain.can_manage_admins());
    }
}
