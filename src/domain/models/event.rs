use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    pub title: String,
    pub dates: String,
    pub venue: String,
    pub start_time: String,
    pub organizers: String,
    pub starts_at: DateTime<FixedOffset>,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            title: "AI WORKSHOP 2025".to_string(),
            dates: "June 11-14, 2025 (can be extended)".to_string(),
            venue: "NIT Jalandhar & Mohali".to_string(),
            start_time: "9:00 AM onwards".to_string(),
            organizers: "NIT Jalandhar, UpGrad, LPU".to_string(),
            starts_at: workshop_start(),
        }
    }
}

/// Midnight IST on 12 June 2025
fn workshop_start() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(IST_OFFSET_SECS)
        .and_then(|ist| ist.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).single())
        .expect("workshop start is a valid IST instant")
}

/// Time left until the workshop starts, broken down for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// All zero once `now` has reached `target`.
    pub fn until(target: DateTime<FixedOffset>, now: DateTime<Utc>) -> Self {
        let remaining = target.with_timezone(&Utc) - now;
        let total = remaining.num_seconds();
        if total <= 0 {
            return Self::default();
        }
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn is_over(&self) -> bool {
        *self == Self::default()
    }
}
