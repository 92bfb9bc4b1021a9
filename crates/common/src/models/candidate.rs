use chrono::{DateTime, FixedOffset};

/// Structured view of one raw feed record. Derived per poll cycle, never
/// persisted. A candidate missing its identifier or symbol is still built
/// (upstream consumers may display it) but is not actionable.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementCandidate {
    /// Stable identifier of the source announcement. Required for any
    /// dedup-ledger interaction.
    pub identifier: Option<String>,
    /// Trading symbol extracted from the reference URL, uppercased.
    pub symbol: Option<String>,
    /// Publish timestamp normalized to IST. `None` when the raw value was
    /// absent or unparseable under every accepted format.
    pub published_at: Option<DateTime<FixedOffset>>,
    /// True when the announcement text carries a currency-plus-magnitude
    /// amount (e.g. "Rs. 50 crore").
    pub has_monetary_signal: bool,
    /// Raw headline, kept for logging.
    pub headline: String,
}

impl AnnouncementCandidate {
    /// Identifier and symbol together, or `None` when the candidate cannot
    /// drive an order.
    pub fn actionable_keys(&self) -> Option<(&str, &str)> {
        match (self.identifier.as_deref(), self.symbol.as_deref()) {
            (Some(id), Some(symbol)) => Some((id, symbol)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_without_symbol_is_not_actionable() {
        let candidate = AnnouncementCandidate {
            identifier: Some("N1".to_string()),
            ..Default::default()
        };
        assert!(candidate.actionable_keys().is_none());
    }

    #[test]
    fn candidate_with_both_keys_is_actionable() {
        let candidate = AnnouncementCandidate {
            identifier: Some("N1".to_string()),
            symbol: Some("ABC".to_string()),
            ..Default::default()
        };
        assert_eq!(candidate.actionable_keys(), Some(("N1", "ABC")));
    }
}
