//! Countdown to a drop release and es-AR long-date formatting.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::drop::parse_release_date;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Time remaining until a release, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    /// Remaining time from `now` until `release`, clamped at zero.
    #[must_use]
    pub fn until(release: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total = (release - now).num_seconds().max(0);
        Self {
            days: total / SECS_PER_DAY,
            hours: (total % SECS_PER_DAY) / SECS_PER_HOUR,
            minutes: (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
            seconds: total % SECS_PER_MINUTE,
        }
    }

    /// Whether the countdown has run out.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// Units as zero-padded two-digit strings: `[days, hours, minutes, seconds]`.
    #[must_use]
    pub fn padded(&self) -> [String; 4] {
        [
            pad(self.days),
            pad(self.hours),
            pad(self.minutes),
            pad(self.seconds),
        ]
    }
}

/// Zero-pad to at least two digits.
#[must_use]
pub fn pad(n: i64) -> String {
    format!("{n:02}")
}

/// Render a release date as `05 de marzo de 2026`.
///
/// The input is returned unchanged when it cannot be parsed.
#[must_use]
pub fn format_release_date(raw: &str) -> String {
    parse_release_date(raw).map_or_else(
        || raw.to_owned(),
        |at| {
            let month = MONTHS
                .get(at.month0() as usize)
                .copied()
                .unwrap_or_default();
            format!("{:02} de {month} de {}", at.day(), at.year())
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_until_decomposes() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let release = now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5);
        let left = TimeLeft::until(release, now);
        assert_eq!(
            left,
            TimeLeft {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(left.padded(), ["02", "03", "04", "05"]);
    }

    #[test]
    fn test_until_clamps_past_release() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let left = TimeLeft::until(now - Duration::hours(1), now);
        assert!(left.is_zero());
    }

    #[test]
    fn test_pad_keeps_wide_numbers() {
        assert_eq!(pad(7), "07");
        assert_eq!(pad(120), "120");
    }

    #[test]
    fn test_format_release_date() {
        assert_eq!(format_release_date("2026-03-05"), "05 de marzo de 2026");
        assert_eq!(
            format_release_date("2025-12-24T21:00:00Z"),
            "24 de diciembre de 2025"
        );
        assert_eq!(format_release_date("muy pronto"), "muy pronto");
    }
}
