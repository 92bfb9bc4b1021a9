use common::models::AnnouncementCandidate;
use serde::Deserialize;

use crate::extract;

/// One page of the BSE corporate announcement feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementPage {
    #[serde(rename = "Table", default)]
    pub table: Vec<AnnouncementRecord>,
}

/// Raw announcement record as the feed serves it. Every field is optional:
/// the upstream omits or blanks fields freely, and a half-filled record must
/// still deserialize so the rest of the batch survives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementRecord {
    #[serde(rename = "NEWSID", default)]
    pub news_id: Option<String>,
    #[serde(rename = "NSURL", default)]
    pub reference_url: Option<String>,
    #[serde(rename = "HEADLINE", default)]
    pub headline: Option<String>,
    #[serde(rename = "NEWSSUB", default)]
    pub subject: Option<String>,
    #[serde(rename = "MORE", default)]
    pub body: Option<String>,
    #[serde(rename = "News_submission_dt", default)]
    pub submitted_at: Option<String>,
    #[serde(rename = "DissemDT", default)]
    pub disseminated_at: Option<String>,
    #[serde(rename = "SLONGNAME", default)]
    pub company: Option<String>,
}

impl AnnouncementRecord {
    /// Builds the structured candidate. Never fails: missing or malformed
    /// fields surface as `None`/`false` on the candidate, and the trigger
    /// decides what is actionable.
    pub fn to_candidate(&self) -> AnnouncementCandidate {
        let text: String = [
            self.headline.as_deref(),
            self.subject.as_deref(),
            self.body.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

        AnnouncementCandidate {
            identifier: self
                .news_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            symbol: self
                .reference_url
                .as_deref()
                .and_then(extract::symbol_from_url),
            published_at: self
                .publish_timestamp()
                .and_then(extract::parse_publish_timestamp),
            has_monetary_signal: extract::has_monetary_signal(&text),
            headline: self.headline.clone().unwrap_or_default(),
        }
    }

    /// Dissemination time is when the market saw the announcement; fall back
    /// to the submission time when it is blank.
    fn publish_timestamp(&self) -> Option<&str> {
        self.disseminated_at
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.submitted_at.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_page_deserializes_with_missing_fields() {
        let raw = r#"{
            "Table": [
                {
                    "NEWSID": "a1b2-c3",
                    "NSURL": "https://www.bseindia.com/stock-share-price/abc-ltd/abc/500410/",
                    "HEADLINE": "Award of Order",
                    "NEWSSUB": "Received an order worth Rs. 50 crore",
                    "DissemDT": "2025-08-22T16:40:12"
                },
                {}
            ],
            "Table1": []
        }"#;

        let page: AnnouncementPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.table.len(), 2);

        let candidate = page.table[0].to_candidate();
        assert_eq!(candidate.identifier.as_deref(), Some("a1b2-c3"));
        assert_eq!(candidate.symbol.as_deref(), Some("ABC"));
        assert!(candidate.has_monetary_signal);
        assert!(candidate.published_at.is_some());

        let empty = page.table[1].to_candidate();
        assert!(empty.actionable_keys().is_none());
        assert!(!empty.has_monetary_signal);
    }

    #[test]
    fn submission_time_is_the_fallback_publish_timestamp() {
        let record = AnnouncementRecord {
            news_id: Some("n".to_string()),
            submitted_at: Some("2025-08-22T10:00:00".to_string()),
            disseminated_at: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(record.to_candidate().published_at.is_some());
    }

    #[test]
    fn unparseable_timestamp_yields_none_not_an_error() {
        let record = AnnouncementRecord {
            news_id: Some("n".to_string()),
            disseminated_at: Some("not a timestamp".to_string()),
            ..Default::default()
        };
        assert!(record.to_candidate().published_at.is_none());
    }
}
