pub mod supervisor;

use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

const HEARTBEAT_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorType {
    FeedPollActor,
    PriceRefreshActor,
}

/// Messages flowing from actors to the supervisor.
#[derive(Debug)]
pub enum ControlMessage {
    Heartbeat(ActorType),
    Error(ActorType, String),
}

/// Keeps the heartbeat task alive for exactly as long as the owning `run`.
/// Dropping the guard aborts the task, so a crashed or aborted incarnation
/// cannot keep pulsing the supervisor and mask its own death.
pub struct HeartbeatGuard(JoinHandle<()>);

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A restartable long-running service. `run` is the whole lifetime of one
/// incarnation; when it errors or stops heartbeating the supervisor builds a
/// fresh instance from the registered factory.
#[async_trait]
pub trait Actor: Send + Sync {
    fn name(&self) -> ActorType;

    /// Instance id, distinguishing restarts of the same actor in the logs.
    fn id(&self) -> Uuid;

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()>;

    fn spawn_heartbeat(&self, supervisor_tx: mpsc::Sender<ControlMessage>) -> HeartbeatGuard {
        let name = self.name();
        HeartbeatGuard(tokio::spawn(async move {
            loop {
                if supervisor_tx
                    .send(ControlMessage::Heartbeat(name))
                    .await
                    .is_err()
                {
                    break;
                }
                tokio::time::sleep(HEARTBEAT_PERIOD).await;
            }
        }))
    }
}
