//! Deduplication Window
//!
//! A plate read is a duplicate if the same normalized text was recorded
//! within the trailing window. Comparison is case- and whitespace-
//! insensitive; the window is measured against each record's recorded-at
//! stamp, not its display timestamp.

use crate::session::RecordedPlate;
use chrono::{DateTime, Utc};

/// Trailing window within which a repeated read is suppressed
pub const DEDUP_WINDOW_MS: i64 = 3000;

/// Canonical form used for duplicate comparison
pub fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

/// True if `text` matches any record newer than the window.
pub fn is_duplicate<'a, I>(records: I, text: &str, now: DateTime<Utc>) -> bool
where
    I: IntoIterator<Item = &'a RecordedPlate>,
{
    let needle = normalize(text);
    records.into_iter().any(|r| {
        normalize(&r.plate.text) == needle
            && now.signed_duration_since(r.recorded_at).num_milliseconds() < DEDUP_WINDOW_MS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Plate;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2026-01-01T12:00:00Z".parse().unwrap()
    }

    fn record(text: &str, at: DateTime<Utc>) -> RecordedPlate {
        RecordedPlate {
            plate: Plate {
                text: text.to_string(),
                confidence: 90.0,
                yolo_confidence: 85.0,
                timestamp: at.to_rfc3339(),
                is_valid: false,
                plate_type: None,
                cropped_image_url: None,
            },
            recorded_at: at,
        }
    }

    #[test]
    fn test_repeat_inside_window_is_duplicate() {
        let records = vec![record("ABC1234", t0())];
        assert!(is_duplicate(
            &records,
            "ABC1234",
            t0() + Duration::milliseconds(DEDUP_WINDOW_MS - 1)
        ));
    }

    #[test]
    fn test_repeat_at_window_boundary_is_kept() {
        let records = vec![record("ABC1234", t0())];
        assert!(!is_duplicate(
            &records,
            "ABC1234",
            t0() + Duration::milliseconds(DEDUP_WINDOW_MS)
        ));
    }

    #[test]
    fn test_comparison_ignores_case_and_whitespace() {
        let records = vec![record("ABC1234", t0())];
        assert!(is_duplicate(
            &records,
            "  abc1234 ",
            t0() + Duration::milliseconds(100)
        ));
    }

    #[test]
    fn test_different_text_is_not_duplicate() {
        let records = vec![record("ABC1234", t0())];
        assert!(!is_duplicate(
            &records,
            "XYZ9876",
            t0() + Duration::milliseconds(100)
        ));
    }

    #[test]
    fn test_old_record_does_not_mask_new_read() {
        // Same plate seen twice: once long ago, once just now.
        let records = vec![
            record("ABC1234", t0() - Duration::seconds(60)),
            record("XYZ9876", t0()),
        ];
        assert!(!is_duplicate(
            &records,
            "ABC1234",
            t0() + Duration::milliseconds(100)
        ));
    }
}
