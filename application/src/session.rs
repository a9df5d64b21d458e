//! Cookie [`Transport`] of session tokens.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::domain::user::{
    self,
    session::{Kind, Token, Tokens},
};

/// Transport of session [`Token`]s in HTTP cookies.
///
/// Every [`Kind`] lives in its own cookie, so a user and an administrator
/// session are set and cleared independently.
#[derive(Clone, Copy, Debug)]
pub struct Transport {
    /// Indicator whether cookies are restricted to HTTPS.
    secure: bool,
}

impl Transport {
    /// Name of the [`Kind::User`] session cookie.
    pub const USER_COOKIE: &'static str = "user_session";

    /// Name of the [`Kind::Admin`] session cookie.
    pub const ADMIN_COOKIE: &'static str = "admin_session";

    /// Creates a new [`Transport`].
    ///
    /// `secure` marks cookies `Secure`, which production deployments require.
    #[must_use]
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Returns the cookie name of the provided [`Kind`].
    #[must_use]
    pub fn cookie_name(kind: Kind) -> &'static str {
        match kind {
            Kind::User => Self::USER_COOKIE,
            Kind::Admin => Self::ADMIN_COOKIE,
        }
    }

    /// Stores the provided [`Token`] of the provided [`Kind`] for the whole
    /// [`user::Session::TTL`].
    ///
    /// Meant to be called by a sign-in handler once it has checked the
    /// credentials and issued the [`Token`] via
    /// [`command::IssueUserSession`].
    ///
    /// [`command::IssueUserSession`]: service::command::IssueUserSession
    #[must_use]
    pub fn set(&self, jar: CookieJar, kind: Kind, token: &Token) -> CookieJar {
        let max_age = time::Duration::try_from(user::Session::TTL)
            .unwrap_or(time::Duration::WEEK);
        jar.add(self.cookie(kind, token.to_string(), max_age))
    }

    /// Clears the [`Token`] of the provided [`Kind`].
    #[must_use]
    pub fn clear(&self, jar: CookieJar, kind: Kind) -> CookieJar {
        jar.add(self.cookie(kind, String::new(), time::Duration::ZERO))
    }

    /// Reads the [`Token`] of the provided [`Kind`], if any.
    #[must_use]
    pub fn get(jar: &CookieJar, kind: Kind) -> Option<Token> {
        jar.get(Self::cookie_name(kind))
            .map(Cookie::value)
            .filter(|v| !v.is_empty())
            .map(Token::from)
    }

    /// Reads [`Token`]s of every [`Kind`].
    #[must_use]
    pub fn tokens(jar: &CookieJar) -> Tokens {
        Tokens {
            user: Self::get(jar, Kind::User),
            admin: Self::get(jar, Kind::Admin),
        }
    }

    /// Builds a session cookie of the provided [`Kind`].
    fn cookie(
        &self,
        kind: Kind,
        value: String,
        max_age: time::Duration,
    ) -> Cookie<'static> {
        Cookie::build((Self::cookie_name(kind), value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
mod spec {
    use axum_extra::extract::cookie::{CookieJar, SameSite};
    use service::domain::user::session::{Kind, Token};

    use super::Transport;

    #[test]
    fn sets_cookie_attributes() {
        let token = Token::from("a.b.c");
        let jar = Transport::new(true).set(CookieJar::new(), Kind::User, &token);

        let cookie = jar.get("user_session").unwrap();
        assert_eq!(cookie.value(), "a.b.c");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604_800)));
    }

    #[test]
    fn secure_only_in_production() {
        let jar = Transport::new(false).set(
            CookieJar::new(),
            Kind::Admin,
            &Token::from("t"),
        );

        let cookie = jar.get("admin_session").unwrap();
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn clears_cookie() {
        let jar = Transport::new(true).clear(CookieJar::new(), Kind::Admin);

        let cookie = jar.get("admin_session").unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
        assert!(jar.get("user_session").is_none());
    }

    #[test]
    fn reads_namespaces_independently() {
        let transport = Transport::new(true);
        let jar = transport.set(CookieJar::new(), Kind::User, &"u".into());
        let jar = transport.set(jar, Kind::Admin, &"a".into());

        let tokens = Transport::tokens(&jar);
        assert_eq!(tokens.user, Some(Token::from("u")));
        assert_eq!(tokens.admin, Some(Token::from("a")));

        let jar = transport.clear(jar, Kind::User);
        let tokens = Transport::tokens(&jar);
        assert_eq!(tokens.user, None);
        assert_eq!(tokens.admin, Some(Token::from("a")));
    }
}
