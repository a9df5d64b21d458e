//! Route classification and authorization policy.

use std::{collections::BTreeSet, sync::LazyLock};

use serde::Deserialize;
use smart_default::SmartDefault;

use crate::domain::user::{session, Role, Session};

/// Marker ending a [`Pattern`] which matches by prefix.
const WILDCARD: char = '*';

/// Path pattern of a [`Rule`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
pub enum Pattern {
    /// Matches the path equal to the literal.
    Exact(String),

    /// Matches any path starting with the literal.
    Prefix(String),
}

impl Pattern {
    /// Checks whether the provided `path` matches this [`Pattern`].
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(lit) => path == lit,
            Self::Prefix(lit) => path.starts_with(lit.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        s.strip_suffix(WILDCARD).map_or_else(
            || Self::Exact(s.to_owned()),
            |lit| Self::Prefix(lit.to_owned()),
        )
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Access level required by a [`Rule`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Served to anyone, no session is inspected.
    Public,

    /// Requires any valid [`Session`].
    Protected,

    /// Requires a [`Session`] whose [`Role`] is in the set.
    RoleGated(BTreeSet<Role>),
}

impl Access {
    /// Indicates whether this [`Access`] requires a [`Session`].
    #[must_use]
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Public)
    }

    /// Indicates whether the provided [`Role`] satisfies this [`Access`].
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Self::Public | Self::Protected => true,
            Self::RoleGated(roles) => roles.contains(&role),
        }
    }
}

/// Single entry of a route [`Table`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Rule {
    /// [`Pattern`] of paths this [`Rule`] applies to.
    pub pattern: Pattern,

    /// [`Access`] required by this [`Rule`].
    pub access: Access,

    /// [`session::Kind`] checked by this [`Rule`].
    #[serde(default)]
    pub session: session::Kind,
}

impl Rule {
    /// Creates a new [`Access::Public`] [`Rule`].
    #[must_use]
    pub fn public(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            access: Access::Public,
            session: session::Kind::User,
        }
    }

    /// Creates a new [`Access::Protected`] [`Rule`].
    #[must_use]
    pub fn protected(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            access: Access::Protected,
            session: session::Kind::User,
        }
    }

    /// Creates a new [`Access::RoleGated`] [`Rule`].
    #[must_use]
    pub fn role_gated(
        pattern: impl Into<Pattern>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            access: Access::RoleGated(roles.into_iter().collect()),
            session: session::Kind::User,
        }
    }

    /// Makes this [`Rule`] check the provided [`session::Kind`].
    #[must_use]
    pub fn on(mut self, session: session::Kind) -> Self {
        self.session = session;
        self
    }
}

/// [`Rule`] applied to paths matching no other [`Rule`].
static FALLBACK: Rule = Rule {
    pattern: Pattern::Prefix(String::new()),
    access: Access::Protected,
    session: session::Kind::User,
};

/// Ordered route table.
///
/// The first matching [`Rule`] wins, so a [`Pattern::Prefix`] listed before a
/// narrower [`Rule`] shadows it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table(Vec<Rule>);

impl Table {
    /// Creates a new [`Table`] out of the provided [`Rule`]s keeping their
    /// order.
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self(rules.into_iter().collect())
    }

    /// Returns the [`Rule`]s of this [`Table`] in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    /// Classifies the provided `path`.
    ///
    /// Paths matching no [`Rule`] require a [`session::Kind::User`]
    /// [`Session`].
    #[must_use]
    pub fn classify(&self, path: &str) -> &Rule {
        self.0
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .unwrap_or(&FALLBACK)
    }
}

impl Default for Table {
    fn default() -> Self {
        /// Default [`Table`] rules.
        static DEFAULT: LazyLock<Vec<Rule>> = LazyLock::new(|| {
            vec![
                Rule::public("/"),
                Rule::public("/sign-in"),
                Rule::public("/sign-up"),
                Rule::public("/forgot-password"),
                Rule::public("/reset-password"),
                Rule::public("/admin/sign-in"),
                Rule::public("/api/auth/*"),
                Rule::public("/api/*"),
                Rule::public("/_next/*"),
                Rule::public("/static/*"),
                Rule::public("/assets/*"),
                Rule::public("/favicon.ico"),
                Rule::role_gated("/admin", [Role::Admin])
                    .on(session::Kind::Admin),
                Rule::role_gated("/admin/*", [Role::Admin])
                    .on(session::Kind::Admin),
            ]
        });

        Self(DEFAULT.clone())
    }
}

/// Pages a denied request is redirected to.
#[derive(Clone, Debug, SmartDefault)]
pub struct Pages {
    /// Sign-in page of [`session::Kind::User`] sessions.
    #[default("/sign-in".to_owned())]
    pub sign_in: String,

    /// Sign-in page of [`session::Kind::Admin`] sessions.
    #[default("/admin/sign-in".to_owned())]
    pub admin_sign_in: String,

    /// Landing page for authenticated but unauthorized requests.
    ///
    /// Must not require a [`Session`], otherwise such requests loop.
    #[default("/".to_owned())]
    pub landing: String,
}

impl Pages {
    /// Query parameter carrying the originally requested path.
    pub const CALLBACK_PARAM: &'static str = "callbackUrl";

    /// Returns the sign-in page for the provided [`session::Kind`],
    /// remembering the requested `path` when it is safe to redirect back to.
    #[must_use]
    pub fn sign_in(&self, kind: session::Kind, path: &str) -> String {
        let page = match kind {
            session::Kind::User => &self.sign_in,
            session::Kind::Admin => &self.admin_sign_in,
        };
        if is_local_path(path) {
            format!(
                "{page}?{}={}",
                Self::CALLBACK_PARAM,
                urlencoding::encode(path),
            )
        } else {
            page.clone()
        }
    }
}

/// Checks whether the provided `path` can only be resolved against the
/// current origin.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Route guard deciding whether a request may pass.
#[derive(Clone, Debug, Default)]
pub struct Guard {
    /// Route [`Table`] of this [`Guard`].
    pub table: Table,

    /// Redirect [`Pages`] of this [`Guard`].
    pub pages: Pages,
}

impl Guard {
    /// Decides on a request to the provided `path` matched by the `rule`,
    /// given the verified [`Session`] (if any) of the `rule`'s kind.
    ///
    /// `path` must not include the query string.
    #[must_use]
    pub fn decide(
        &self,
        path: &str,
        rule: &Rule,
        session: Option<&Session>,
    ) -> Decision {
        if !rule.access.requires_session() {
            return Decision::Allowed;
        }
        let Some(session) = session else {
            return Decision::Denied(Denial {
                reason: Reason::Unauthenticated,
                redirect: self.pages.sign_in(rule.session, path),
            });
        };
        if !rule.access.permits(session.role()) {
            return Decision::Denied(Denial {
                reason: Reason::Forbidden,
                redirect: self.pages.landing.clone(),
            });
        }
        Decision::Allowed
    }
}

/// Terminal decision of a [`Guard`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Request may pass.
    Allowed,

    /// Request is denied.
    Denied(Denial),
}

/// Details of a denied request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Denial {
    /// [`Reason`] of this [`Denial`].
    pub reason: Reason,

    /// Location to redirect page requests to.
    pub redirect: String,
}

/// Reason of a [`Denial`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    /// No valid [`Session`] is presented.
    Unauthenticated,

    /// [`Session`] is valid, but its [`Role`] is insufficient.
    Forbidden,
}

#[cfg(test)]
mod spec {
    use super::{Access, Pages, Pattern, Rule, Table};
    use crate::domain::user::{session, Role};

    #[test]
    fn parses_patterns() {
        assert_eq!(Pattern::from("/api/*"), Pattern::Prefix("/api/".into()));
        assert_eq!(Pattern::from("/"), Pattern::Exact("/".into()));

        assert!(Pattern::from("/api/*").matches("/api/"));
        assert!(Pattern::from("/api/*").matches("/api/anything/else"));
        assert!(!Pattern::from("/api/*").matches("/api"));
        assert!(Pattern::from("/sign-in").matches("/sign-in"));
        assert!(!Pattern::from("/sign-in").matches("/sign-in/extra"));
    }

    #[test]
    fn classifies_default_table() {
        let table = Table::default();

        for public in ["/", "/api/anything", "/api/auth/session", "/sign-in"] {
            assert_eq!(
                table.classify(public).access,
                Access::Public,
                "`{public}` must be public",
            );
        }

        let dashboard = table.classify("/dashboard");
        assert_eq!(dashboard.access, Access::Protected);
        assert_eq!(dashboard.session, session::Kind::User);

        for path in ["/admin", "/admin/users"] {
            let admin = table.classify(path);
            assert!(admin.access.requires_session(), "`{path}` is gated");
            assert!(admin.access.permits(Role::Admin));
            assert!(!admin.access.permits(Role::User));
            assert_eq!(admin.session, session::Kind::Admin);
        }

        assert_eq!(table.classify("/admin/sign-in").access, Access::Public);
    }

    #[test]
    fn first_match_wins() {
        let narrow_first = Table::new([
            Rule::protected("/docs/private"),
            Rule::public("/docs/*"),
        ]);
        assert_eq!(
            narrow_first.classify("/docs/private").access,
            Access::Protected,
        );
        assert_eq!(narrow_first.classify("/docs/intro").access, Access::Public);

        let broad_first = Table::new([
            Rule::public("/docs/*"),
            Rule::protected("/docs/private"),
        ]);
        assert_eq!(
            broad_first.classify("/docs/private").access,
            Access::Public,
        );
    }

    #[test]
    fn unmatched_paths_are_protected() {
        let table = Table::new([Rule::public("/")]);
        let rule = table.classify("/anything");
        assert_eq!(rule.access, Access::Protected);
        assert_eq!(rule.session, session::Kind::User);
    }

    #[test]
    fn sign_in_redirect_keeps_only_local_paths() {
        let pages = Pages::default();

        assert_eq!(
            pages.sign_in(session::Kind::User, "/dashboard/forms"),
            "/sign-in?callbackUrl=%2Fdashboard%2Fforms",
        );
        assert_eq!(
            pages.sign_in(session::Kind::Admin, "/admin/users"),
            "/admin/sign-in?callbackUrl=%2Fadmin%2Fusers",
        );
        assert_eq!(
            pages.sign_in(session::Kind::User, "//evil.example.com"),
            "/sign-in",
        );
        assert_eq!(
            pages.sign_in(session::Kind::User, "/\\evil.example.com"),
            "/sign-in",
        );
    }
}
