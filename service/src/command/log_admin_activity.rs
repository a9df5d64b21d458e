//! [`Command`] for logging an administrator [`Activity`].

use std::{convert::Infallible, fmt};

use common::operations::Insert;
use tracing as log;

use crate::{
    domain::{admin::Activity, user},
    infra::Audit,
    Service,
};

use super::Command;

/// [`Command`] for logging an administrator [`Activity`].
///
/// Best effort: a failure to record the [`Activity`] is logged and never
/// fails the action being audited.
#[derive(Clone, Debug)]
pub struct LogAdminActivity {
    /// ID of the administrator who performed the action.
    pub user_id: user::Id,

    /// Performed action.
    pub action: String,

    /// Free-form details of the action.
    pub details: String,
}

impl<A> Command<LogAdminActivity> for Service<A>
where
    A: Audit<Insert<Activity>, Ok = ()>,
    A::Err: fmt::Display,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: LogAdminActivity,
    ) -> Result<Self::Ok, Self::Err> {
        let LogAdminActivity {
            user_id,
            action,
            details,
        } = cmd;

        let activity = Activity::new(user_id, action, details);
        let (id, action) = (activity.id, activity.action.clone());
        if let Err(e) = self.audit().execute(Insert(activity)).await {
            log::warn!("failed to log `{action}` activity `{id}`: {e}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::sync::Arc;

    use crate::{
        command::{authorize_user_session::spec::service, Command as _},
        domain::user,
        infra::audit::{spec::Recorder, Queue},
    };

    use super::LogAdminActivity;

    fn activity(action: &str) -> LogAdminActivity {
        LogAdminActivity {
            user_id: "admin-1".into(),
            action: action.into(),
            details: "{}".into(),
        }
    }

    #[tokio::test]
    async fn records_activity() {
        let recorder = Arc::new(Recorder::default());
        let svc = service(Arc::clone(&recorder));

        svc.execute(activity("session.view")).await.unwrap();
        svc.execute(activity("session.sign_out")).await.unwrap();

        assert_eq!(recorder.actions(), ["session.view", "session.sign_out"]);
        let entries = recorder.0.lock().unwrap();
        assert!(entries.iter().all(|a| a.user_id == user::Id::from("admin-1")));
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[tokio::test]
    async fn swallows_audit_failures() {
        let recorder = Arc::new(Recorder::default());
        let (queue, drain) = Queue::new(Arc::clone(&recorder), 1);
        let svc = service(queue);

        svc.execute(activity("first")).await.unwrap();
        svc.execute(activity("dropped")).await.unwrap();

        drop(svc);
        drain.run().await.unwrap();
        assert_eq!(recorder.actions(), ["first"]);
    }
}
