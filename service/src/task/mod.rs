//! Background [`Task`]s definitions.

mod background;
pub mod prune_rate_limits;

pub use common::Handler as Task;

pub use self::{background::Background, prune_rate_limits::PruneRateLimits};
