use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};

const BASE_URL: &str = "https://www.bseindia.com/download/BhavCopy/Equity";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of per-day end-of-day price files. `Ok(None)` means the exchange
/// published no file for that day (weekend probing aside, that is the normal
/// holiday signal), which is distinct from a transport failure.
#[async_trait]
pub trait EodSource: Send + Sync {
    async fn fetch_day(&self, day: NaiveDate) -> anyhow::Result<Option<String>>;
}

/// Downloads the BSE equity bhavcopy, one CSV per trading day.
pub struct BhavcopyClient {
    client: Client,
    base_url: String,
}

impl BhavcopyClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: BASE_URL.to_string(),
        }
    }

    fn file_url(&self, day: NaiveDate) -> String {
        format!(
            "{}/BhavCopy_BSE_CM_0_0_0_{}_F_0000.CSV",
            self.base_url,
            day.format("%Y%m%d")
        )
    }
}

impl Default for BhavcopyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EodSource for BhavcopyClient {
    async fn fetch_day(&self, day: NaiveDate) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(self.file_url(day))
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .context("Failed to request the bhavcopy file")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            bail!("Bhavcopy download returned HTTP {status}");
        }

        let body = response
            .text()
            .await
            .context("Failed to read the bhavcopy body")?;
        Ok(Some(body))
    }
}

/// Parsed bhavcopy: total data rows, plus symbol → positive closing price.
#[derive(Debug, Default)]
pub struct BhavcopyTable {
    pub rows: usize,
    pub prices: HashMap<String, f64>,
}

/// Parses a bhavcopy CSV body. Fails only when the expected columns
/// (`TckrSymb`, `ClsPric`) are absent; individual bad rows are dropped.
pub fn parse_bhavcopy(body: &str) -> anyhow::Result<BhavcopyTable> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .context("Bhavcopy has no readable header row")?
        .clone();
    let symbol_col = headers
        .iter()
        .position(|h| h.trim() == "TckrSymb")
        .context("Bhavcopy is missing the TckrSymb column")?;
    let price_col = headers
        .iter()
        .position(|h| h.trim() == "ClsPric")
        .context("Bhavcopy is missing the ClsPric column")?;

    let mut table = BhavcopyTable::default();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        table.rows += 1;

        let symbol = record.get(symbol_col).unwrap_or("").trim().to_uppercase();
        let Ok(price) = record.get(price_col).unwrap_or("").trim().parse::<f64>() else {
            continue;
        };
        if !symbol.is_empty() && price > 0.0 {
            table.prices.insert(symbol, price);
        }
    }
    Ok(table)
}
