use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, warn};

use common::logger;
use common::settings::Settings;
use market_data::price_cache::PriceCache;
use market_data::remote::{BhavcopyClient, BseClient};

use crate::actors::ActorType;
use crate::actors::supervisor::Supervisor;
use crate::ledger::DedupLedger;
use crate::remote::{Brokerage, KiteClient};
use crate::services::autotrade_service::AutoTradeService;
use crate::services::feed_poll_service::FeedPollService;
use crate::services::price_refresh_service::PriceRefreshService;

mod actors;
mod ledger;
mod remote;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();

    let mut settings = Settings::load();
    let kite = Arc::new(KiteClient::new(&settings.kite));

    if !kite.is_authenticated().await {
        if settings.kite.request_token.is_empty() {
            warn!(
                "No Kite session; complete the login flow at {} and set KITE_REQUEST_TOKEN",
                kite.login_url()
            );
        } else {
            match kite.generate_session(&settings.kite.request_token).await {
                Ok(access_token) => {
                    settings.kite.access_token = access_token;
                    settings.kite.request_token.clear();
                    if let Err(e) = settings.save_credentials() {
                        warn!("Failed to persist the new access token: {e:#}");
                    }
                }
                Err(e) => warn!("Kite session exchange failed: {e}"),
            }
        }
    }

    if settings.autotrade.enabled {
        info!(
            "Auto-trade enabled with a notional of INR {:.0} per order",
            settings.autotrade.notional_inr
        );
    } else {
        info!("Auto-trade disabled; announcements will be polled but not acted on");
    }

    let prices = PriceCache::new();
    let bhavcopy = Arc::new(BhavcopyClient::new());
    let feed = Arc::new(BseClient::new());
    let autotrade = Arc::new(AutoTradeService::new(
        kite.clone() as Arc<dyn Brokerage>,
        prices.clone(),
        DedupLedger::new(),
        settings.autotrade.clone(),
    ));

    let mut supervisor = Supervisor::new();

    let prices_for_refresh = prices.clone();
    supervisor.register(
        ActorType::PriceRefreshActor,
        Box::new(move || {
            Box::new(PriceRefreshService::new(
                bhavcopy.clone(),
                prices_for_refresh.clone(),
            ))
        }),
    );

    supervisor.register(
        ActorType::FeedPollActor,
        Box::new(move || Box::new(FeedPollService::new(feed.clone(), autotrade.clone()))),
    );

    supervisor.start().await;
    Ok(())
}
