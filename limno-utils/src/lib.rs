//! Shared utility functions for limno crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

    /// Minute-resolution format used in Alplakes simulation URLs: "YYYYMMDDHHMM"
    pub const API_MINUTE_FORMAT: &str = "%Y%m%d%H%M";

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Format an instant for a simulation API path segment.
    pub fn format_api_minute(instant: &DateTime<Utc>) -> String {
        instant.format(API_MINUTE_FORMAT).to_string()
    }

    /// Parse an ISO-8601 instant. A trailing `Z` and a missing offset are
    /// both read as UTC.
    pub fn parse_iso_instant(s: &str) -> anyhow::Result<DateTime<Utc>> {
        let trimmed = s.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(parsed.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))?;
        Ok(naive.and_utc())
    }

    /// Parse a user-supplied instant: "YYYY-MM-DD", "YYYY-MM-DDTHH:MM" or
    /// full ISO-8601.
    pub fn parse_user_instant(s: &str) -> anyhow::Result<DateTime<Utc>> {
        if let Ok(date) = parse_date(s) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
            return Ok(naive.and_utc());
        }
        parse_iso_instant(s)
    }

    /// Convert model time (seconds after `reference`) into an instant.
    pub fn from_model_seconds(reference: &DateTime<Utc>, seconds: f64) -> anyhow::Result<DateTime<Utc>> {
        let millis = (seconds * 1000.0).round() as i64;
        let delta = TimeDelta::try_milliseconds(millis)
            .ok_or_else(|| anyhow::anyhow!("model time {} out of range", seconds))?;
        reference
            .checked_add_signed(delta)
            .ok_or_else(|| anyhow::anyhow!("model time {} out of range", seconds))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_parse_date() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            assert_eq!(parse_date("2023-06-15").unwrap(), date);
            assert!(parse_date("15.06.2023").is_err());
        }

        #[test]
        fn test_format_api_minute() {
            let instant = Utc.with_ymd_and_hms(2024, 5, 1, 7, 5, 0).unwrap();
            assert_eq!(format_api_minute(&instant), "202405010705");
        }

        #[test]
        fn test_parse_iso_instant_variants() {
            let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
            assert_eq!(parse_iso_instant("2024-05-01T12:00:00Z").unwrap(), expected);
            assert_eq!(parse_iso_instant("2024-05-01T12:00:00+00:00").unwrap(), expected);
            assert_eq!(parse_iso_instant("2024-05-01T14:00:00+02:00").unwrap(), expected);
            assert_eq!(parse_iso_instant("2024-05-01T12:00:00").unwrap(), expected);
            assert!(parse_iso_instant("yesterday").is_err());
        }

        #[test]
        fn test_parse_user_instant() {
            let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
            assert_eq!(parse_user_instant("2024-05-01").unwrap(), midnight);
            let morning = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
            assert_eq!(parse_user_instant("2024-05-01T09:30").unwrap(), morning);
        }

        #[test]
        fn test_from_model_seconds() {
            let reference = Utc.with_ymd_and_hms(2008, 3, 1, 0, 0, 0).unwrap();
            let instant = from_model_seconds(&reference, 86_400.0 + 1.5).unwrap();
            assert_eq!(instant.to_rfc3339(), "2008-03-02T00:00:01.500+00:00");
        }
    }
}

/// Model-versus-measurement metrics
pub mod metrics {
    /// Root mean square error over the pairs where both sides are numbers.
    ///
    /// Returns NaN when no such pair exists or the lengths differ.
    pub fn compute_rmse(prediction: &[f64], measures: &[f64]) -> f64 {
        if prediction.len() != measures.len() {
            return f64::NAN;
        }
        let squares: Vec<f64> = prediction
            .iter()
            .zip(measures)
            .map(|(p, m)| (p - m).powi(2))
            .filter(|d| !d.is_nan())
            .collect();
        if squares.is_empty() {
            return f64::NAN;
        }
        (squares.iter().sum::<f64>() / squares.len() as f64).sqrt()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_rmse_basic() {
            assert_eq!(compute_rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
            assert_eq!(compute_rmse(&[0.0, 0.0], &[3.0, 4.0]), 12.5_f64.sqrt());
        }

        #[test]
        fn test_rmse_ignores_nan_pairs() {
            assert_eq!(compute_rmse(&[1.0, f64::NAN, 5.0], &[2.0, 0.0, f64::NAN]), 1.0);
            assert!(compute_rmse(&[f64::NAN], &[1.0]).is_nan());
            assert!(compute_rmse(&[1.0], &[1.0, 2.0]).is_nan());
        }
    }
}
