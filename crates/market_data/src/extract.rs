//! Pattern extraction for raw feed records.
//!
//! The upstream feed carries everything as loosely formatted strings, so the
//! accepted formats are pinned down here in plain functions rather than being
//! matched inline at the call sites. If the feed drifts, these are the tests
//! that break.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use common::time::ist;

/// Trading symbol from a BSE reference URL.
///
/// Accepted shape: a path whose final segment is the all-numeric scrip code
/// and whose second-to-last segment is the trading symbol, e.g.
/// `https://www.bseindia.com/stock-share-price/abc-industries-ltd/abc/500410/`.
/// Query strings, fragments and trailing slashes are tolerated. Returns the
/// symbol uppercased, or `None` when the URL does not match.
pub fn symbol_from_url(url: &str) -> Option<String> {
    let path = url.trim().split(['?', '#']).next().unwrap_or("");
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());

    let scrip_code = segments.next()?;
    if !scrip_code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let symbol = segments.next()?;
    let valid = symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && symbol.chars().any(|c| c.is_ascii_alphabetic());
    valid.then(|| symbol.to_uppercase())
}

const MAGNITUDE_WORDS: &[&str] = &["crore", "crores", "cr", "lakh", "lakhs"];

/// True when the text contains a currency marker (`₹`, `Rs`, `Rs.`, `INR`)
/// followed by a numeric quantity followed by a magnitude word
/// (`crore`/`cr`/`lakh` and plurals), case-insensitive. The amount may be
/// glued to either neighbour ("Rs.50 crore", "INR 75crore") or stand alone
/// ("₹ 30 lakh"), and may carry comma grouping ("Rs 1,250 crore").
pub fn has_monetary_signal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']'))
        .filter(|t| !t.is_empty())
        .collect();

    let mut idx = 0;
    while idx < tokens.len() {
        if let Some(glued) = strip_currency_marker(tokens[idx]) {
            let (amount, magnitude_at) = if glued.is_empty() {
                match tokens.get(idx + 1) {
                    Some(next) => (*next, idx + 2),
                    None => break,
                }
            } else {
                (glued, idx + 1)
            };

            if let Some(rest) = strip_amount(amount) {
                let matched = if rest.is_empty() {
                    tokens.get(magnitude_at).is_some_and(|t| is_magnitude_word(t))
                } else {
                    is_magnitude_word(rest)
                };
                if matched {
                    return true;
                }
            }
        }
        idx += 1;
    }
    false
}

/// Strips a leading currency marker from a lowercased token. Returns the
/// remainder, which must be empty or start with a digit (so "rs" matches but
/// "rsvp" does not).
fn strip_currency_marker(token: &str) -> Option<&str> {
    for marker in ["₹", "rs.", "rs", "inr"] {
        if let Some(rest) = token.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit()) {
                return Some(rest);
            }
        }
    }
    None
}

/// Strips a leading numeric quantity (digits with optional `.`/`,`) and
/// returns the remainder. `None` when the token has no leading digits at all.
fn strip_amount(token: &str) -> Option<&str> {
    let mut saw_digit = false;
    let mut end = 0;
    for (pos, c) in token.char_indices() {
        if c.is_ascii_digit() {
            saw_digit = true;
        } else if c != '.' && c != ',' {
            break;
        }
        end = pos + c.len_utf8();
    }
    saw_digit.then(|| &token[end..])
}

fn is_magnitude_word(token: &str) -> bool {
    let trimmed = token.trim_matches(|c: char| matches!(c, '.' | ',' | ';' | '"' | '\''));
    MAGNITUDE_WORDS.contains(&trimmed)
}

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
];

/// Publish timestamp in one of the feed's observed formats.
///
/// Accepts RFC 3339 (offset respected, then normalized to IST) and the
/// offset-less forms `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS[.fff]`
/// and `DD-MM-YYYY HH:MM:SS`, which are assumed to already be IST wall-clock
/// times. Returns `None` for anything else; the caller treats that as a
/// non-fatal skip.
pub fn parse_publish_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&ist()));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return naive.and_local_timezone(ist()).single();
        }
    }
    None
}
