//! [`User`] identity definitions carried by sessions.

pub mod session;

use derive_more::{AsRef, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::EnumString;

pub use self::session::Session;

/// Identity of a platform user, as known to the access-control layer.
///
/// Accounts themselves live in an external store, so only the fields embedded
/// into a session token are modeled here.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// Display [`Name`] of this [`User`].
    pub name: Name,

    /// [`Role`] of this [`User`].
    pub role: Role,
}

/// Opaque ID of a [`User`], stable for the account's lifetime.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Id(String);

/// Username of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Username(String);

/// Email address of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Email(String);

/// Display name of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Splits this [`Name`] into the first and the last name at the first
    /// whitespace.
    ///
    /// The last name is empty for single-word names.
    #[must_use]
    pub fn split(&self) -> (&str, &str) {
        let name = self.0.trim();
        name.split_once(char::is_whitespace)
            .map_or((name, ""), |(first, last)| (first, last.trim_start()))
    }
}

/// Role of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    strum::Display,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Regular end-user.
    User,

    /// Administrator.
    Admin,

    /// Super-administrator.
    SuperAdmin,
}
