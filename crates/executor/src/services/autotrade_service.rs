use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, error, info, trace, warn};

use common::models::OrderRequest;
use common::settings::AutoTradeSettings;
use market_data::price_cache::PriceCache;
use market_data::remote::AnnouncementRecord;

use crate::ledger::DedupLedger;
use crate::remote::Brokerage;

/// An announcement older than this is not acted on. The reference price is a
/// day old anyway; the value of the trigger is entirely in reacting within
/// seconds of publication.
pub const FRESHNESS_WINDOW_MS: i64 = 30_000;

/// True when the publish time is not in the future and at most the freshness
/// window ago. The boundary itself (exactly 30.0 s) is still eligible.
pub fn is_fresh(published_at: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    let elapsed_ms = (now - published_at).num_milliseconds();
    (0..=FRESHNESS_WINDOW_MS).contains(&elapsed_ms)
}

/// Turns fresh order-award announcements into market buys, at most once per
/// announcement.
///
/// Per-identifier ordering is fixed: ledger reservation, then price lookup,
/// then order submission, then implicit commit (or rollback on a rejected
/// order). The ledger reservation is the only synchronization between
/// overlapping poll cycles.
pub struct AutoTradeService {
    broker: Arc<dyn Brokerage>,
    prices: PriceCache,
    ledger: DedupLedger,
    settings: AutoTradeSettings,
}

impl AutoTradeService {
    pub fn new(
        broker: Arc<dyn Brokerage>,
        prices: PriceCache,
        ledger: DedupLedger,
        settings: AutoTradeSettings,
    ) -> Self {
        Self {
            broker,
            prices,
            ledger,
            settings,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// One poll cycle. Never returns an error: a bad record is logged and
    /// skipped so the rest of the batch still runs.
    pub async fn process(&self, batch: &[AnnouncementRecord], now: DateTime<FixedOffset>) {
        if !self.settings.enabled {
            trace!("Auto-trade disabled; ignoring {} records", batch.len());
            return;
        }
        if !self.broker.is_authenticated().await {
            debug!("Not authenticated with the brokerage; skipping this poll cycle");
            return;
        }

        for record in batch {
            self.handle_record(record, now).await;
        }
    }

    async fn handle_record(&self, record: &AnnouncementRecord, now: DateTime<FixedOffset>) {
        let candidate = record.to_candidate();
        let Some((identifier, symbol)) = candidate.actionable_keys() else {
            trace!("Record without identifier or symbol; not actionable");
            return;
        };

        if !candidate.has_monetary_signal {
            trace!(identifier, "No monetary amount in the announcement text");
            return;
        }
        let Some(published_at) = candidate.published_at else {
            debug!(identifier, "Unparseable publish timestamp; skipping this record");
            return;
        };
        if !is_fresh(published_at, now) {
            trace!(identifier, "Outside the freshness window");
            return;
        }

        if !self.ledger.try_reserve(identifier) {
            debug!(identifier, "Already claimed by an earlier poll cycle");
            return;
        }

        // From here on the reservation is ours. It is released only when the
        // brokerage rejects the order; the skips below are one-shot.
        let Some(price) = self.prices.lookup(symbol).filter(|p| *p > 0.0) else {
            warn!(
                identifier,
                symbol, "No cached reference price; abandoning this announcement"
            );
            return;
        };

        let units = (self.settings.notional_inr / price).floor() as i64;
        if units <= 0 {
            warn!(
                identifier,
                symbol, price, "Reference price exceeds the order notional; abandoning"
            );
            return;
        }
        let Ok(quantity) = u32::try_from(units) else {
            warn!(
                identifier,
                symbol, price, "Computed quantity does not fit an order; abandoning"
            );
            return;
        };

        let order = OrderRequest::market_buy(symbol, quantity);
        match self.broker.place_order(&order).await {
            Ok(order_id) => {
                info!(
                    identifier,
                    symbol, quantity, order_id, "Auto-trade order placed"
                );
            }
            Err(e) => {
                self.ledger.rollback(identifier);
                error!(
                    identifier,
                    symbol, "Order placement failed; reservation released for retry: {e}"
                );
            }
        }
    }
}
