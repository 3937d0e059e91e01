// Timestamp formatting shared by tooltips and the mark text view
use chrono::{DateTime, Local, TimeZone, Utc};

const ISO_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM:SS` in `tz`.
pub fn format_iso_in<Tz: TimeZone>(ts_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(utc) => utc.with_timezone(tz).format(ISO_FORMAT).to_string(),
        None => ts_ms.to_string(),
    }
}

pub fn format_iso_local(ts_ms: i64) -> String {
    format_iso_in(ts_ms, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_format_iso_in_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_iso_in(1_700_000_000_000, &tz), "2023-11-15 00:13:20");
        assert_eq!(format_iso_in(1_700_000_000_999, &Utc), "2023-11-14 22:13:20");
    }
}
