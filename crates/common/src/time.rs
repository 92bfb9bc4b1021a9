use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Indian Standard Time (UTC+05:30). Both BSE feeds and the bhavcopy file
/// names are keyed to this zone.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

pub fn now_ist() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist())
}

pub fn today_ist() -> NaiveDate {
    now_ist().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ist_is_five_thirty_ahead_of_utc() {
        let utc = Utc.with_ymd_and_hms(2025, 9, 18, 4, 30, 0).unwrap();
        let local = utc.with_timezone(&ist());
        assert_eq!(local.to_rfc3339(), "2025-09-18T10:00:00+05:30");
    }
}
