use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{error, info, warn};

use crate::actors::{Actor, ActorType, ControlMessage};

type ActorFactory = Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

const PULSE_CHECK_PERIOD: Duration = Duration::from_secs(1);
const PULSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Keeps the long-running actors alive: any actor that stops heartbeating or
/// reports a fatal error is aborted and rebuilt from its factory.
pub struct Supervisor {
    factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    pub fn register(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);
        let mut check_interval = time::interval(PULSE_CHECK_PERIOD);

        let registered: Vec<ActorType> = self.factories.keys().copied().collect();
        for actor_type in registered {
            self.spawn_actor(actor_type, supervisor_tx.clone());
        }

        loop {
            tokio::select! {
                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(actor_type) => {
                            self.pulses.insert(actor_type, Instant::now());
                        }
                        ControlMessage::Error(actor_type, message) => {
                            error!("{actor_type:?} reported: {message}");
                            self.pulses.insert(actor_type, Instant::now());
                        }
                    }
                }

                _ = check_interval.tick() => {
                    let stale_before = Instant::now() - PULSE_TIMEOUT;
                    let stale: Vec<ActorType> = self
                        .pulses
                        .iter()
                        .filter(|&(_, &pulse)| pulse < stale_before)
                        .map(|(&actor_type, _)| actor_type)
                        .collect();

                    for actor_type in stale {
                        warn!("{actor_type:?} is unresponsive; restarting");
                        if let Some(handle) = self.handles.remove(&actor_type) {
                            handle.abort();
                        }
                        self.spawn_actor(actor_type, supervisor_tx.clone());
                    }
                }
            }
        }
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let Some(factory) = self.factories.get(&actor_type) else {
            return;
        };
        let mut actor = factory();
        info!("Spawning {actor_type:?} ({})", actor.id());

        let handle = tokio::spawn(async move {
            if let Err(e) = actor.run(tx).await {
                error!("{actor_type:?} crashed: {e:#}");
            }
        });
        self.handles.insert(actor_type, handle);
        self.pulses.insert(actor_type, Instant::now());
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    /// Spawns its heartbeat and immediately crashes, like a poller whose
    /// first network call panics the task.
    struct CrashingActor {
        id: Uuid,
    }

    #[async_trait]
    impl Actor for CrashingActor {
        fn name(&self) -> ActorType {
            ActorType::FeedPollActor
        }

        fn id(&self) -> Uuid {
            self.id
        }

        async fn run(
            &mut self,
            supervisor_tx: mpsc::Sender<ControlMessage>,
        ) -> anyhow::Result<()> {
            let _heartbeat = self.spawn_heartbeat(supervisor_tx);
            anyhow::bail!("crashed on startup")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_actor_is_rebuilt_from_its_factory() {
        let spawns = Arc::new(AtomicUsize::new(0));

        let mut supervisor = Supervisor::new();
        let spawn_counter = spawns.clone();
        supervisor.register(
            ActorType::FeedPollActor,
            Box::new(move || {
                spawn_counter.fetch_add(1, Ordering::SeqCst);
                Box::new(CrashingActor { id: Uuid::new_v4() })
            }),
        );

        let running = tokio::spawn(async move { supervisor.start().await });

        // Well past the pulse timeout plus one check period, twice over.
        tokio::time::sleep(Duration::from_secs(10)).await;
        running.abort();

        let rebuilt = spawns.load(Ordering::SeqCst);
        assert!(rebuilt >= 2, "expected a restart, saw {rebuilt} spawn(s)");
    }
}
