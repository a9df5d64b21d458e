//! Infrastructure layer.

pub mod audit;

pub use self::audit::Audit;
