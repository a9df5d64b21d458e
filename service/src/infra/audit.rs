//! [`Audit`] log infrastructure.

use std::{convert::Infallible, fmt};

use common::operations::Insert;
use derive_more::{Display, Error as StdError};
use tokio::sync::mpsc;
use tracing as log;

use crate::domain::admin::Activity;

/// Audit log operation.
pub use common::Handler as Audit;

/// [`Audit`] error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Queue`] has no free capacity.
    #[display("`audit::Queue` is full")]
    QueueFull,

    /// [`Drain`] of a [`Queue`] has stopped.
    #[display("`audit::Queue` is closed")]
    QueueClosed,
}

/// [`Audit`] recording [`Activity`] entries into the application log.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tracing;

impl Audit<Insert<Activity>> for Tracing {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Insert(activity): Insert<Activity>,
    ) -> Result<Self::Ok, Self::Err> {
        log::info!(
            target: "audit",
            id = %activity.id,
            user_id = %activity.user_id,
            action = %activity.action,
            details = %activity.details,
            performed_at = activity.performed_at.unix_timestamp(),
            "admin activity",
        );
        Ok(())
    }
}

/// Bounded [`Audit`] queue.
///
/// Inserting never waits: when the queue is full the [`Activity`] is rejected
/// right away. Queued entries are written by the paired [`Drain`].
#[derive(Clone, Debug)]
pub struct Queue {
    /// Sending half of the queue.
    tx: mpsc::Sender<Activity>,
}

impl Queue {
    /// Creates a new [`Queue`] holding up to `capacity` entries, along with
    /// the [`Drain`] writing them into the provided `sink`.
    #[must_use]
    pub fn new<A>(sink: A, capacity: usize) -> (Self, Drain<A>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, Drain { rx, sink })
    }
}

impl Audit<Insert<Activity>> for Queue {
    type Ok = ();
    type Err = Error;

    async fn execute(
        &self,
        Insert(activity): Insert<Activity>,
    ) -> Result<Self::Ok, Self::Err> {
        self.tx.try_send(activity).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::QueueFull,
            mpsc::error::TrySendError::Closed(_) => Error::QueueClosed,
        })
    }
}

/// Receiving side of a [`Queue`] writing [`Activity`] entries into a sink.
#[derive(Debug)]
pub struct Drain<A> {
    /// Receiving half of the queue.
    rx: mpsc::Receiver<Activity>,

    /// [`Audit`] sink the entries are written into.
    sink: A,
}

impl<A> Drain<A>
where
    A: Audit<Insert<Activity>, Ok = ()>,
    A::Err: fmt::Display,
{
    /// Writes queued entries until every [`Queue`] is dropped.
    ///
    /// Sink failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Never errors.
    pub async fn run(mut self) -> Result<(), Infallible> {
        while let Some(activity) = self.rx.recv().await {
            let id = activity.id;
            if let Err(e) = self.sink.execute(Insert(activity)).await {
                log::warn!("failed to write `Activity({id})`: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use common::operations::Insert;

    use super::{Audit, Error, Queue};
    use crate::domain::admin::Activity;

    /// [`Audit`] remembering every written [`Activity`].
    #[derive(Debug, Default)]
    pub(crate) struct Recorder(pub(crate) Mutex<Vec<Activity>>);

    impl Recorder {
        pub(crate) fn actions(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|a| a.action.clone())
                .collect()
        }
    }

    impl Audit<Insert<Activity>> for Recorder {
        type Ok = ();
        type Err = Infallible;

        async fn execute(
            &self,
            Insert(activity): Insert<Activity>,
        ) -> Result<(), Infallible> {
            self.0.lock().unwrap().push(activity);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drains_queued_entries() {
        let recorder = Arc::new(Recorder::default());
        let (queue, drain) = Queue::new(Arc::clone(&recorder), 8);

        for action in ["first", "second"] {
            queue
                .execute(Insert(Activity::new("u1".into(), action, "")))
                .await
                .unwrap();
        }
        drop(queue);
        drain.run().await.unwrap();

        assert_eq!(recorder.actions(), ["first", "second"]);
    }

    #[tokio::test]
    async fn rejects_when_full() {
        let (queue, _drain) = Queue::new(Recorder::default(), 1);

        queue
            .execute(Insert(Activity::new("u1".into(), "first", "")))
            .await
            .unwrap();
        let err = queue
            .execute(Insert(Activity::new("u1".into(), "second", "")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueueFull));
    }

    #[tokio::test]
    async fn rejects_when_closed() {
        let (queue, drain) = Queue::new(Recorder::default(), 1);
        drop(drain);

        let err = queue
            .execute(Insert(Activity::new("u1".into(), "first", "")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueueClosed));
    }
}
