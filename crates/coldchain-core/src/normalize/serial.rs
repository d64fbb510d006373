use crate::time::SECONDS_PER_DAY;
use chrono::{Duration, FixedOffset, NaiveDate};

/// India Standard Time, the reporting zone spreadsheet serials are shifted to
/// unless configured otherwise.
pub const DEFAULT_REPORTING_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Converts a spreadsheet date serial into a unix timestamp.
///
/// Day zero is 1899-12-30: the 1900-01-01 epoch minus two days, one for the
/// one-based count and one for the phantom 1900-02-29. The fractional part is
/// the time of day, rounded to the nearest second. The result is shifted by
/// the reporting offset.
pub fn serial_to_timestamp(serial: f64, offset: FixedOffset) -> Option<i64> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.floor();
    let seconds_of_day = ((serial - days) * SECONDS_PER_DAY as f64).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let naive = epoch
        .checked_add_signed(Duration::try_days(days as i64)?)?
        .checked_add_signed(Duration::try_seconds(seconds_of_day)?)?;
    Some(naive.and_utc().timestamp() + i64::from(offset.local_minus_utc()))
}

#[cfg(test)]
mod tests {
    use super::{serial_to_timestamp, DEFAULT_REPORTING_OFFSET_SECS};
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn serial_epoch_matches_unix_epoch() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(serial_to_timestamp(25_569.0, utc), Some(0));
    }

    #[test]
    fn fractional_day_becomes_time_of_day() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let ts = serial_to_timestamp(45_000.75, utc).unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 3, 15, 18, 0, 0).unwrap().timestamp();
        assert_eq!(ts, expected);
    }

    #[test]
    fn reporting_offset_is_applied() {
        let ist = FixedOffset::east_opt(DEFAULT_REPORTING_OFFSET_SECS).unwrap();
        let ts = serial_to_timestamp(45_000.5, ist).unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 3, 15, 17, 30, 0).unwrap().timestamp();
        assert_eq!(ts, expected);
    }

    #[test]
    fn imprecise_fractions_round_to_the_second() {
        let utc = FixedOffset::east_opt(0).unwrap();
        // 07:12:00 is 0.3 of a day, which is not exactly representable.
        let ts = serial_to_timestamp(45_000.3, utc).unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 3, 15, 7, 12, 0).unwrap().timestamp();
        assert_eq!(ts, expected);
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(serial_to_timestamp(-1.0, utc), None);
        assert_eq!(serial_to_timestamp(f64::NAN, utc), None);
    }
}
