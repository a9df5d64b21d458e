//! [`PruneRateLimits`] [`Task`].

use std::{convert::Infallible, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracing as log;

use crate::{rate_limit::RateLimiter, Service};

use super::Task;

/// Configuration for [`PruneRateLimits`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`RateLimiter`] prunings.
    pub interval: time::Duration,
}

/// [`Task`] forgetting idle clients of a [`RateLimiter`].
#[derive(Clone, Debug)]
pub struct PruneRateLimits {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`RateLimiter`] to prune.
    limiter: RateLimiter,
}

impl<A> Task<Start<By<PruneRateLimits, Config>>> for Service<A> {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<PruneRateLimits, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = PruneRateLimits {
            config: by.into_inner(),
            limiter: self.rate_limiter().clone(),
        };

        let mut interval =
            interval(task.config.interval.max(time::Duration::from_millis(1)));
        loop {
            let _ = interval.tick().await;
            task.execute(Perform(())).await?;
        }
    }
}

impl Task<Perform<()>> for PruneRateLimits {
    type Ok = ();
    type Err = Infallible;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let forgotten = self.limiter.prune().await;
        if forgotten > 0 {
            log::debug!("`task::PruneRateLimits` forgot {forgotten} idle keys");
        }
        Ok(())
    }
}
