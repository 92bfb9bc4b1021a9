use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use reqwest::Client;

use crate::remote::{AnnouncementPage, AnnouncementRecord};

const BASE_URL: &str = "https://api.bseindia.com/BseIndiaAPI/api";
const CATEGORY: &str = "Company Update";
const SUBCATEGORY: &str = "Award of Order / Receipt of Order";

// The BSE API refuses requests that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Client for the BSE corporate announcement feed.
pub struct BseClient {
    client: Client,
    base_url: String,
}

impl BseClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Fetches the day's order-award announcements. Any transport or decode
    /// failure is the caller's to log; the next poll cycle simply retries.
    pub async fn fetch_announcements(
        &self,
        day: NaiveDate,
    ) -> anyhow::Result<Vec<AnnouncementRecord>> {
        let date = day.format("%Y%m%d").to_string();
        let url = format!("{}/AnnSubCategoryGetData/w", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("pageno", "1"),
                ("strCat", CATEGORY),
                ("strPrevDate", date.as_str()),
                ("strScrip", ""),
                ("strSearch", "P"),
                ("strToDate", date.as_str()),
                ("strType", "C"),
                ("subcategory", SUBCATEGORY),
            ])
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", "https://www.bseindia.com/")
            .header("Origin", "https://www.bseindia.com")
            .send()
            .await
            .context("Failed to reach the announcement feed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Announcement feed returned HTTP {status}");
        }

        let page: AnnouncementPage = response
            .json()
            .await
            .context("Failed to decode the announcement feed payload")?;
        Ok(page.table)
    }
}

impl Default for BseClient {
    fn default() -> Self {
        Self::new()
    }
}
