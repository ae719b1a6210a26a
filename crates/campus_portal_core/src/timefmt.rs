//! crates/campus_portal_core/src/timefmt.rs
//!
//! Human-relative timestamp bucketing for the notification dropdown.

use chrono::{DateTime, Utc};

/// Formats how long ago `created_at` was, relative to `now`.
///
/// Buckets use integer-floor division on elapsed seconds:
/// under a minute is "Just now", then minutes, hours, and days. Computed at
/// render time; never cached.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - created_at).num_seconds().max(0);

    if elapsed < 60 {
        "Just now".to_string()
    } else if elapsed < 3600 {
        format!("{}m ago", elapsed / 60)
    } else if elapsed < 86_400 {
        format!("{}h ago", elapsed / 3600)
    } else {
        format!("{}d ago", elapsed / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago(seconds: i64) -> String {
        let now = Utc::now();
        time_ago(now - Duration::seconds(seconds), now)
    }

    #[test]
    fn buckets_match_the_dropdown_copy() {
        assert_eq!(ago(0), "Just now");
        assert_eq!(ago(30), "Just now");
        assert_eq!(ago(59), "Just now");
        assert_eq!(ago(60), "1m ago");
        assert_eq!(ago(125), "2m ago");
        assert_eq!(ago(3599), "59m ago");
        assert_eq!(ago(3600), "1h ago");
        assert_eq!(ago(7250), "2h ago");
        assert_eq!(ago(86_399), "23h ago");
        assert_eq!(ago(90_000), "1d ago");
        assert_eq!(ago(200_000), "2d ago");
    }

    #[test]
    fn clock_skew_into_the_future_reads_as_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::seconds(45), now), "Just now");
    }
}
