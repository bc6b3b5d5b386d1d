//! Coarse relative-age labels ("5m ago").

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH_DAYS: i64 = 30;
const YEAR_MONTHS: i64 = 12;

/// Labels the age of `timestamp` relative to `now`.
///
/// Every level truncates. A month is 30 days and a year 12 such months, so
/// 360 days already reads "1y ago". Timestamps ahead of `now` read "just now".
pub fn age_label(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    if seconds < MINUTE {
        return "just now".to_string();
    }

    let minutes = seconds / MINUTE;
    if seconds < HOUR {
        return format!("{minutes}m ago");
    }

    let hours = seconds / HOUR;
    if seconds < DAY {
        return format!("{hours}h ago");
    }

    let days = seconds / DAY;
    if days < MONTH_DAYS {
        return format!("{days}d ago");
    }

    let months = days / MONTH_DAYS;
    if months < YEAR_MONTHS {
        return format!("{months}mo ago");
    }

    format!("{}y ago", months / YEAR_MONTHS)
}
