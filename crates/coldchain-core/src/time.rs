use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("timestamp cannot be empty")]
    Empty,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid timestamp format: expected RFC 3339, YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS]")]
    InvalidDateTime,
    #[error("invalid utc offset: expected +HH:MM or -HH:MM")]
    InvalidOffset,
}

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Parses a wire timestamp. Values without an explicit offset are read as UTC.
pub fn parse_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or(TimeParseError::InvalidDate)?;
        return Ok(naive.and_utc().timestamp());
    }

    Err(TimeParseError::InvalidDateTime)
}

pub fn parse_offset(input: &str) -> Result<FixedOffset, TimeParseError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or(TimeParseError::InvalidOffset);
    }
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(TimeParseError::InvalidOffset),
    };
    let (hours, minutes) = rest.split_once(':').ok_or(TimeParseError::InvalidOffset)?;
    let hours: i32 = hours.parse().map_err(|_| TimeParseError::InvalidOffset)?;
    let minutes: i32 = minutes.parse().map_err(|_| TimeParseError::InvalidOffset)?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(TimeParseError::InvalidOffset);
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or(TimeParseError::InvalidOffset)
}

pub fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_offset, parse_timestamp, TimeParseError};
    use chrono::{TimeZone, Utc};

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        let ts = parse_timestamp("2025-05-01T10:00:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap().timestamp();
        assert_eq!(ts, expected);
    }

    #[test]
    fn parse_timestamp_accepts_millis_and_offsets() {
        let ts = parse_timestamp("2023-05-01T08:00:00.000Z").unwrap();
        assert_eq!(
            ts,
            Utc.with_ymd_and_hms(2023, 5, 1, 8, 0, 0).unwrap().timestamp()
        );
        let shifted = parse_timestamp("2023-05-01T13:30:00+05:30").unwrap();
        assert_eq!(shifted, ts);
    }

    #[test]
    fn parse_timestamp_reads_naive_values_as_utc() {
        let ts = parse_timestamp("2025-05-01 10:00").unwrap();
        assert_eq!(
            ts,
            Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap().timestamp()
        );
        let date_only = parse_timestamp("2025-05-01").unwrap();
        assert_eq!(
            date_only,
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("  "), Err(TimeParseError::Empty));
        assert_eq!(
            parse_timestamp("next tuesday"),
            Err(TimeParseError::InvalidDateTime)
        );
    }

    #[test]
    fn parse_offset_handles_signs() {
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_offset("-03:00").unwrap().local_minus_utc(), -10_800);
        assert_eq!(parse_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("05:30").is_err());
        assert!(parse_offset("+25:00").is_err());
    }

    #[test]
    fn format_timestamp_is_utc_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap().timestamp();
        assert_eq!(format_timestamp(ts), "2025-05-01T10:00:00Z");
    }
}
