//! Domain definitions.

pub mod admin;
pub mod route;
pub mod user;

pub use self::user::User;
