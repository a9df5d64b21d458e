//! [`Session`] definitions.

use std::{collections::BTreeSet, time::Duration};

use common::{DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From};
use serde::{Deserialize, Serialize};

use super::{Role, User};

/// Claims embedded into a session [`Token`].
///
/// Claims are integrity-protected only, never encrypted, so nothing secret
/// may be placed here.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    /// [`User`] this session is issued for.
    #[serde(flatten)]
    pub user: User,

    /// [`DateTime`] when the session was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssueDateTime,

    /// Explicit super-administrator flag.
    ///
    /// Only meaningful together with [`Role::Admin`].
    #[serde(
        rename = "isSuperAdmin",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub super_admin: bool,

    /// Authorization-only permissions granted to the session.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub permissions: BTreeSet<String>,
}

impl Claims {
    /// Creates new [`Claims`] for the provided [`User`] issued right now.
    #[must_use]
    pub fn new(user: User) -> Self {
        Self {
            user,
            issued_at: DateTime::now().coerce(),
            super_admin: false,
            permissions: BTreeSet::new(),
        }
    }

    /// Marks these [`Claims`] with the explicit super-administrator flag.
    #[must_use]
    pub fn super_admin(mut self) -> Self {
        self.super_admin = true;
        self
    }

    /// Grants the provided permissions to these [`Claims`].
    #[must_use]
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Returns [`DateTime`] when a session with these [`Claims`] expires.
    #[must_use]
    pub fn expires_at(&self) -> ExpirationDateTime {
        (self.issued_at + Session::TTL).coerce()
    }
}

/// Verified user session.
///
/// Can only be obtained by verifying a [`Token`], so holding one proves that
/// the signature and the expiration of its [`Token`] have been checked.
#[derive(Clone, Debug)]
pub struct Session {
    /// [`Claims`] of this [`Session`].
    claims: Claims,

    /// [`DateTime`] when this [`Session`] expires.
    expires_at: ExpirationDateTime,
}

impl Session {
    /// Lifetime of a [`Session`] since its issuance.
    pub const TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Returns [`Claims`] of this [`Session`].
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns [`User`] of this [`Session`].
    #[must_use]
    pub fn user(&self) -> &User {
        &self.claims.user
    }

    /// Returns [`Role`] of this [`Session`].
    #[must_use]
    pub fn role(&self) -> Role {
        self.claims.user.role
    }

    /// Returns [`DateTime`] when this [`Session`] expires.
    #[must_use]
    pub fn expires_at(&self) -> ExpirationDateTime {
        self.expires_at
    }

    /// Consumes this [`Session`] returning its [`Claims`].
    #[must_use]
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

/// Payload signed into a [`Token`].
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Payload {
    /// Signed [`Claims`].
    #[serde(flatten)]
    pub(crate) claims: Claims,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub(crate) expires_at: ExpirationDateTime,
}

impl Payload {
    /// Builds the [`Payload`] to sign for the provided [`Claims`].
    pub(crate) fn new(claims: Claims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            claims,
            expires_at,
        }
    }

    /// Turns this [`Payload`] into a [`Session`].
    ///
    /// Must only be called once the [`Token`] carrying this [`Payload`] has
    /// been verified.
    pub(crate) fn into_verified(self) -> Session {
        let Self {
            claims,
            expires_at,
        } = self;
        Session {
            claims,
            expires_at,
        }
    }
}

/// Signed token of a [`Session`].
///
/// Nothing is checked on construction: a [`Token`] is just a candidate until
/// it is verified into a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
#[from(&str, String)]
pub struct Token(String);

/// Namespace a [`Session`] [`Token`] is transported in.
///
/// End-user and elevated admin sessions coexist and are cleared
/// independently.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Regular user session.
    #[default]
    User,

    /// Elevated administrator session.
    Admin,
}

/// Candidate [`Token`]s of every [`Kind`] presented by a client.
#[derive(Clone, Debug, Default)]
pub struct Tokens {
    /// [`Token`] of [`Kind::User`] session.
    pub user: Option<Token>,

    /// [`Token`] of [`Kind::Admin`] session.
    pub admin: Option<Token>,
}

impl Tokens {
    /// Returns the [`Token`] of the provided [`Kind`], if any.
    #[must_use]
    pub fn get(&self, kind: Kind) -> Option<&Token> {
        match kind {
            Kind::User => self.user.as_ref(),
            Kind::Admin => self.admin.as_ref(),
        }
    }
}

/// Marker of an issuance [`DateTime`].
#[derive(Clone, Copy, Debug)]
pub struct Issue;

/// Marker of an expiration [`DateTime`].
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] of a [`Session`] issuance.
pub type IssueDateTime = DateTimeOf<(Session, Issue)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;
