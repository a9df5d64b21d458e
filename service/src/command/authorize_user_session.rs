//! [`Command`] for verifying a [`Session`] [`session::Token`].

use std::convert::Infallible;

use derive_more::From;
use jsonwebtoken::{Algorithm, Validation};
use tracing as log;

use crate::{
    domain::user::{
        session::{self, Payload},
        Session,
    },
    Service,
};

use super::Command;

/// [`Command`] for verifying a [`Session`] [`session::Token`].
///
/// Fails closed: a malformed, forged or expired [`session::Token`], as well
/// as a missing signing secret, results in [`None`] rather than an error.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to verify.
    pub token: session::Token,
}

impl<A> Command<AuthorizeUserSession> for Service<A> {
    type Ok = Option<Session>;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUserSession { token } = cmd;

        let Some(jwt) = self.config().jwt.as_ref() else {
            log::error!(
                "cannot verify `Session` token: no signing secret configured",
            );
            return Ok(None);
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(jsonwebtoken::decode::<Payload>(
            token.as_ref(),
            &jwt.decoding_key,
            &validation,
        )
        .map_err(|e| log::debug!("rejected `Session` token: {e}"))
        .ok()
        .map(|data| data.claims.into_verified()))
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use common::DateTime;
    use secrecy::SecretString;

    use crate::{
        command::{Command as _, IssueUserSession},
        domain::{
            route,
            user::{session::Claims, Role, User},
        },
        task, Config, Jwt, Service,
    };

    use super::AuthorizeUserSession;

    pub(crate) fn config(secret: Option<&str>) -> Config {
        Config {
            jwt: secret.and_then(|s| {
                Jwt::from_secret(&SecretString::from(s.to_owned()))
            }),
            guard: route::Guard::default(),
            rate_limit: crate::rate_limit::Config::default(),
            prune_rate_limits: task::prune_rate_limits::Config {
                interval: Duration::from_secs(60),
            },
        }
    }

    pub(crate) fn service<A: Clone + 'static>(audit: A) -> Service<A> {
        Service::new(config(Some("test-secret")), audit).0
    }

    pub(crate) fn user(role: Role) -> User {
        User {
            id: "user-1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            name: "Ada Lovelace".into(),
            role,
        }
    }

    pub(crate) async fn sign<A>(svc: &Service<A>, claims: Claims) -> String {
        svc.execute(IssueUserSession { claims })
            .await
            .unwrap()
            .token
            .to_string()
    }

    async fn verify<A>(svc: &Service<A>, token: &str) -> Option<Claims> {
        svc.execute(AuthorizeUserSession {
            token: token.into(),
        })
        .await
        .unwrap()
        .map(crate::domain::user::Session::into_claims)
    }

    #[tokio::test]
    async fn round_trips_claims() {
        let svc = service(());

        for role in [Role::User, Role::Admin, Role::SuperAdmin] {
            let claims = Claims::new(user(role));
            let token = sign(&svc, claims.clone()).await;
            assert_eq!(verify(&svc, &token).await, Some(claims));
        }

        let claims = Claims::new(user(Role::Admin))
            .super_admin()
            .with_permissions(["admins:manage", "forms:read"]);
        let token = sign(&svc, claims.clone()).await;
        assert_eq!(verify(&svc, &token).await, Some(claims));
    }

    #[tokio::test]
    async fn embeds_expected_claims_shape() {
        let svc = service(());
        let claims = Claims {
            issued_at: DateTime::from_unix_timestamp(1_700_000_000)
                .unwrap()
                .coerce(),
            ..Claims::new(user(Role::User))
        };
        let output = svc
            .execute(IssueUserSession {
                claims: claims.clone(),
            })
            .await
            .unwrap();
        assert_eq!(
            output.expires_at.unix_timestamp(),
            1_700_000_000 + 604_800,
        );

        let token = output.token.to_string();
        let payload = token.split('.').nth(1).unwrap();
        let json = URL_SAFE_NO_PAD.decode(payload).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "user-1",
                "username": "ada",
                "email": "ada@example.com",
                "name": "Ada Lovelace",
                "role": "user",
                "iat": 1_700_000_000,
                "exp": 1_700_604_800,
            }),
        );
    }

    #[tokio::test]
    async fn rejects_tampered_tokens() {
        let svc = service(());
        let token = sign(&svc, Claims::new(user(Role::User))).await;

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                verify(&svc, &tampered).await,
                None,
                "token tampered at byte {i} must be rejected",
            );
        }
    }

    #[tokio::test]
    async fn rejects_expired_tokens() {
        let svc = service(());
        let claims = Claims {
            issued_at: (DateTime::now() - Duration::from_secs(8 * 24 * 3600))
                .coerce(),
            ..Claims::new(user(Role::User))
        };
        let token = sign(&svc, claims).await;

        assert_eq!(verify(&svc, &token).await, None);
    }

    #[tokio::test]
    async fn rejects_malformed_and_foreign_tokens() {
        let svc = service(());
        assert_eq!(verify(&svc, "").await, None);
        assert_eq!(verify(&svc, "not-a-token").await, None);
        assert_eq!(verify(&svc, "a.b.c").await, None);

        let foreign = Service::new(config(Some("another-secret")), ()).0;
        let token = sign(&foreign, Claims::new(user(Role::Admin))).await;
        assert_eq!(verify(&svc, &token).await, None);
    }

    #[tokio::test]
    async fn fails_closed_without_secret() {
        let signed = sign(&service(()), Claims::new(user(Role::User))).await;
        let svc = Service::new(config(None), ()).0;

        let err = svc
            .execute(IssueUserSession {
                claims: Claims::new(user(Role::User)),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            crate::command::issue_user_session::ExecutionError::ConfigurationMissing,
        ));
        assert_eq!(verify(&svc, &signed).await, None);
    }

    #[test]
    fn empty_secret_is_missing() {
        assert!(config(Some("")).jwt.is_none());
    }
}
