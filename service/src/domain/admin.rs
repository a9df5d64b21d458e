//! Administrator [`Session`] and [`Activity`] definitions.

use std::collections::BTreeSet;

use common::{DateTime, DateTimeOf};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::user::{self, Role};

/// Elevated administrator session.
///
/// Derived from a verified [`user::Session`] on every request and never
/// persisted: only the signed token is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    /// ID of the administrator.
    pub id: user::Id,

    /// [`user::Email`] of the administrator.
    pub email: user::Email,

    /// [`Role`] of the administrator.
    pub role: Role,

    /// Permissions granted to this [`Session`].
    pub permissions: BTreeSet<String>,

    /// First name of the administrator.
    pub first_name: String,

    /// Last name of the administrator.
    pub last_name: String,

    /// Indicator whether the administrator account is active.
    pub is_active: bool,

    /// [`DateTime`] of the sign-in this [`Session`] originates from.
    pub last_login_at: user::session::IssueDateTime,

    /// Indicator whether the administrator is a super-administrator.
    pub is_super_admin: bool,
}

impl Session {
    /// Derives an administrator [`Session`] from the provided verified
    /// [`user::Session`].
    ///
    /// [`None`] is returned unless the [`user::Session`] has [`Role::Admin`].
    #[must_use]
    pub fn derive(session: &user::Session) -> Option<Self> {
        let claims = session.claims();
        if claims.user.role != Role::Admin {
            return None;
        }

        let (first_name, last_name) = claims.user.name.split();
        Some(Self {
            id: claims.user.id.clone(),
            email: claims.user.email.clone(),
            role: claims.user.role,
            permissions: claims.permissions.clone(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            is_active: true,
            last_login_at: claims.issued_at,
            is_super_admin: claims.super_admin,
        })
    }

    /// Indicates whether this [`Session`] may manage other administrators.
    ///
    /// Callers needing a stricter check must additionally test
    /// [`Session::is_super_admin`].
    #[must_use]
    pub fn can_manage_admins(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Audit log entry of an administrator action.
#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    /// ID of this [`Activity`].
    pub id: Uuid,

    /// ID of the [`user::User`] who performed the action.
    pub user_id: user::Id,

    /// Performed action.
    pub action: String,

    /// Free-form details of the action.
    pub details: String,

    /// [`DateTime`] when the action was performed.
    #[serde(with = "common::datetime::serde::unix_timestamp")]
    pub performed_at: PerformDateTime,
}

impl Activity {
    /// Creates a new [`Activity`] performed right now.
    #[must_use]
    pub fn new(
        user_id: user::Id,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action: action.into(),
            details: details.into(),
            performed_at: DateTime::now().coerce(),
        }
    }
}

/// Marker of an [`Activity`] performing [`DateTime`].
#[derive(Clone, Copy, Debug)]
pub struct Perform;

/// [`DateTime`] when an [`Activity`] was performed.
pub type PerformDateTime = DateTimeOf<(Activity, Perform)>;
