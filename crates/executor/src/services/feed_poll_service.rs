use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use common::time::now_ist;
use market_data::remote::BseClient;

use crate::actors::{Actor, ActorType, ControlMessage};
use crate::services::autotrade_service::AutoTradeService;

/// Short enough to catch an announcement well inside the freshness window,
/// long enough not to trip the feed's rate limiting.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls the corporate announcement feed and hands each batch to the
/// auto-trade pipeline. A failed poll is logged and the next tick retries;
/// nothing short of a panic stops the loop.
pub struct FeedPollService {
    id: Uuid,
    feed: Arc<BseClient>,
    autotrade: Arc<AutoTradeService>,
}

impl FeedPollService {
    pub fn new(feed: Arc<BseClient>, autotrade: Arc<AutoTradeService>) -> Self {
        Self {
            id: Uuid::new_v4(),
            feed,
            autotrade,
        }
    }
}

#[async_trait]
impl Actor for FeedPollService {
    fn name(&self) -> ActorType {
        ActorType::FeedPollActor
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx);

        let mut ticks = time::interval(POLL_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let now = now_ist();

            match self.feed.fetch_announcements(now.date_naive()).await {
                Ok(batch) => {
                    debug!("Announcement poll returned {} records", batch.len());
                    self.autotrade.process(&batch, now).await;
                }
                Err(e) => warn!("Announcement poll failed: {e:#}"),
            }
        }
    }
}
