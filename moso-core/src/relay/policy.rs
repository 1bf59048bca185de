//! Time windows gating a relay.

/// A referral record older than this is no longer relayed.
pub const EXPIRATION_WINDOW_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// After a send attempt, further attempts within this interval are skipped.
pub const RESEND_SUPPRESSION_MILLIS: i64 = 10_000;

/// Whether a record of this age has expired. The boundary itself is still valid.
pub fn is_expired(age_millis: i64) -> bool {
    age_millis > EXPIRATION_WINDOW_MILLIS
}

/// Whether a send this long after the previous one must be skipped.
pub fn is_suppressed(since_last_send_millis: i64) -> bool {
    since_last_send_millis <= RESEND_SUPPRESSION_MILLIS
}

/// Parse a stored send timestamp.
///
/// Accepts an integer, optionally written in float notation with no
/// fractional part (`"1.7e12"`). Anything else is `None` and should be purged.
pub fn parse_send_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_window_is_seven_days() {
        assert_eq!(EXPIRATION_WINDOW_MILLIS, 604_800_000);
    }

    #[test]
    fn expiry_boundary() {
        assert!(!is_expired(0));
        assert!(!is_expired(EXPIRATION_WINDOW_MILLIS));
        assert!(is_expired(EXPIRATION_WINDOW_MILLIS + 1));
    }

    #[test]
    fn record_from_the_future_is_not_expired() {
        assert!(!is_expired(-5_000));
    }

    #[test]
    fn suppression_boundary() {
        assert!(is_suppressed(0));
        assert!(is_suppressed(RESEND_SUPPRESSION_MILLIS));
        assert!(!is_suppressed(RESEND_SUPPRESSION_MILLIS + 1));
    }

    #[test]
    fn parse_integer_timestamps() {
        assert_eq!(parse_send_timestamp("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_send_timestamp(" 42 "), Some(42));
        assert_eq!(parse_send_timestamp("1.7e12"), Some(1_700_000_000_000));
        assert_eq!(parse_send_timestamp("12.0"), Some(12));
    }

    #[test]
    fn parse_rejects_non_integers() {
        assert_eq!(parse_send_timestamp("not-a-number"), None);
        assert_eq!(parse_send_timestamp("12.5"), None);
        assert_eq!(parse_send_timestamp(""), None);
        assert_eq!(parse_send_timestamp("NaN"), None);
        assert_eq!(parse_send_timestamp("inf"), None);
    }
}
