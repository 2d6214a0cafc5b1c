use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Backend primary keys are 64-bit integers.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Naive formats the backend emits for `LocalDateTime` fields.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a backend timestamp string.
///
/// Accepts RFC 3339 as well as the zone-less `yyyy-MM-dd HH:mm:ss` shapes.
/// Zone-less values are interpreted in the local time zone, which is the
/// zone the backend formats them in. Returns `None` for blank or
/// unrecognized input.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-03-01T09:30:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn parses_naive_formats_consistently() {
        let a = parse_timestamp("2024-03-01 09:30:00").unwrap();
        let b = parse_timestamp("2024-03-01T09:30:00").unwrap();
        let c = parse_timestamp("2024-03-01 09:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn blank_and_garbage_are_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
