use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{debug, error, info, warn};

use crate::remote::{EodSource, parse_bhavcopy};

/// How many calendar days back to probe for the last trading day.
pub const MAX_PROBE_DAYS: i64 = 15;

/// A bhavcopy is accepted only when both its row count and its usable price
/// count exceed this; anything smaller is a partial upload, not a trading day.
pub const MIN_COMPLETE_ROWS: usize = 1000;

/// Last-known end-of-day closing prices, symbol (uppercase) → price.
///
/// Cheap to clone; all clones share one snapshot. A refresh swaps the whole
/// mapping in one write, so readers either see the previous complete snapshot
/// or the new one, never a half-filled cache.
#[derive(Clone, Default)]
pub struct PriceCache {
    inner: Arc<RwLock<HashMap<String, f64>>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive closing-price lookup. `None` when the cache has not
    /// been populated yet or the symbol is unknown; never an error.
    pub fn lookup(&self, symbol: &str) -> Option<f64> {
        let key = symbol.trim().to_uppercase();
        if key.is_empty() {
            return None;
        }
        self.read().get(&key).copied()
    }

    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Atomically replaces the whole mapping. Keys are normalized uppercase
    /// on the way in.
    pub fn replace(&self, snapshot: HashMap<String, f64>) {
        let normalized: HashMap<String, f64> = snapshot
            .into_iter()
            .map(|(symbol, price)| (symbol.trim().to_uppercase(), price))
            .collect();
        *self.inner.write().expect("price cache lock poisoned") = normalized;
    }

    /// Probes backward from `today - 1` for up to [`MAX_PROBE_DAYS`] calendar
    /// days and installs the first complete bhavcopy found. Weekends are
    /// skipped without touching the network; a missing file or a failed fetch
    /// just moves the probe to the previous day. Returns the number of cached
    /// symbols, or `None` when no day qualified — in which case the existing
    /// snapshot is left untouched.
    pub async fn refresh_from(&self, source: &dyn EodSource, today: NaiveDate) -> Option<usize> {
        for offset in 1..=MAX_PROBE_DAYS {
            let day = today - Duration::days(offset);
            if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            match source.fetch_day(day).await {
                Ok(Some(body)) => match parse_bhavcopy(&body) {
                    Ok(table)
                        if table.rows > MIN_COMPLETE_ROWS
                            && table.prices.len() > MIN_COMPLETE_ROWS =>
                    {
                        let count = table.prices.len();
                        info!(
                            "Accepted bhavcopy for {day}: {count} symbols from {} rows",
                            table.rows
                        );
                        self.replace(table.prices);
                        return Some(count);
                    }
                    Ok(table) => {
                        debug!(
                            "Bhavcopy for {day} incomplete ({} rows, {} priced); trying previous day",
                            table.rows,
                            table.prices.len()
                        );
                    }
                    Err(e) => {
                        warn!("Bhavcopy for {day} has an unexpected format: {e:#}");
                    }
                },
                Ok(None) => {
                    debug!("No bhavcopy published for {day}; trying previous day");
                }
                Err(e) => {
                    warn!("Bhavcopy fetch failed for {day}: {e:#}");
                }
            }
        }

        error!("No complete trading day found in the last {MAX_PROBE_DAYS} days; keeping the existing snapshot");
        None
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, f64>> {
        self.inner.read().expect("price cache lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted source that records which days were requested.
    struct ScriptedSource {
        days: HashMap<NaiveDate, String>,
        requested: Mutex<Vec<NaiveDate>>,
    }

    impl ScriptedSource {
        fn new(days: HashMap<NaiveDate, String>) -> Self {
            Self {
                days,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<NaiveDate> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EodSource for ScriptedSource {
        async fn fetch_day(&self, day: NaiveDate) -> anyhow::Result<Option<String>> {
            self.requested.lock().unwrap().push(day);
            Ok(self.days.get(&day).cloned())
        }
    }

    fn complete_csv(symbols: usize) -> String {
        let mut body = String::from("TckrSymb,ClsPric\n");
        for i in 0..symbols {
            body.push_str(&format!("SYM{i},{}.5\n", 10 + i));
        }
        body
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_cache_lookup_returns_none() {
        let cache = PriceCache::new();
        assert_eq!(cache.lookup("ABC"), None);
        assert_eq!(cache.lookup(""), None);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let cache = PriceCache::new();
        cache.replace(HashMap::from([("abc".to_string(), 100.0)]));
        assert_eq!(cache.lookup("abc"), Some(100.0));
        assert_eq!(cache.lookup("ABC"), Some(100.0));
        assert_eq!(cache.lookup(" abc "), Some(100.0));
    }

    #[tokio::test]
    async fn probe_accepts_first_complete_day_and_never_fetches_weekends() {
        // Thursday. Offsets 1..7 reach back to Thursday the 11th; the 13th
        // and 14th are the weekend.
        let today = day(2025, 9, 18);
        let target = day(2025, 9, 11);

        let source = ScriptedSource::new(HashMap::from([(target, complete_csv(1200))]));
        let cache = PriceCache::new();

        assert_eq!(cache.refresh_from(&source, today).await, Some(1200));

        let requested = source.requested();
        assert_eq!(
            requested,
            vec![
                day(2025, 9, 17),
                day(2025, 9, 16),
                day(2025, 9, 15),
                day(2025, 9, 12),
                day(2025, 9, 11),
            ]
        );
        assert!(
            requested
                .iter()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
        assert_eq!(cache.lookup("sym0"), Some(10.5));
    }

    #[tokio::test]
    async fn incomplete_days_are_passed_over() {
        let today = day(2025, 9, 18);
        let source = ScriptedSource::new(HashMap::from([
            (day(2025, 9, 17), complete_csv(10)),
            (day(2025, 9, 16), complete_csv(1500)),
        ]));
        let cache = PriceCache::new();

        assert_eq!(cache.refresh_from(&source, today).await, Some(1500));
        assert_eq!(source.requested().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_probe_reports_failure_and_keeps_the_old_snapshot() {
        let today = day(2025, 9, 18);
        let cache = PriceCache::new();
        cache.replace(HashMap::from([("OLD".to_string(), 42.0)]));

        let source = ScriptedSource::new(HashMap::new());
        assert_eq!(cache.refresh_from(&source, today).await, None);

        // 15 calendar days back from a Thursday contain 4 weekend days.
        assert_eq!(source.requested().len(), 11);
        assert_eq!(cache.lookup("OLD"), Some(42.0));
    }

    #[tokio::test]
    async fn malformed_day_is_skipped_not_fatal() {
        let today = day(2025, 9, 18);
        let source = ScriptedSource::new(HashMap::from([
            (day(2025, 9, 17), "Symbol,Close\nABC,1\n".to_string()),
            (day(2025, 9, 16), complete_csv(1100)),
        ]));
        let cache = PriceCache::new();

        assert_eq!(cache.refresh_from(&source, today).await, Some(1100));
    }
}
