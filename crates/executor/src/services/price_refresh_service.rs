use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use uuid::Uuid;

use common::time::today_ist;
use market_data::price_cache::PriceCache;
use market_data::remote::BhavcopyClient;

use crate::actors::{Actor, ActorType, ControlMessage};

/// Closing prices only change once a trading day; refreshing a few times a
/// day rides out a bhavcopy that is published late.
const REFRESH_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Keeps the reference-price cache current. The first refresh runs
/// immediately on startup so the trigger pipeline has prices from the first
/// poll cycle.
pub struct PriceRefreshService {
    id: Uuid,
    source: Arc<BhavcopyClient>,
    prices: PriceCache,
}

impl PriceRefreshService {
    pub fn new(source: Arc<BhavcopyClient>, prices: PriceCache) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            prices,
        }
    }
}

#[async_trait]
impl Actor for PriceRefreshService {
    fn name(&self) -> ActorType {
        ActorType::PriceRefreshActor
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let _heartbeat = self.spawn_heartbeat(supervisor_tx.clone());

        let mut ticks = time::interval(REFRESH_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;

            if self
                .prices
                .refresh_from(self.source.as_ref(), today_ist())
                .await
                .is_none()
            {
                let _ = supervisor_tx
                    .send(ControlMessage::Error(
                        self.name(),
                        "Reference price refresh found no complete trading day".to_string(),
                    ))
                    .await;
            }
        }
    }
}
