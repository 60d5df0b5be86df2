use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct Countdown {
    pub target: NaiveDate,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// True once local midnight of `target` has passed; the other fields are then zero.
    pub passed: bool,
}

/// Time left until midnight of `target` in the venue's time zone.
pub fn countdown(target: NaiveDate, offset: FixedOffset, now: DateTime<Utc>) -> Countdown {
    let local_now = now.with_timezone(&offset).naive_local();
    let remaining = target.and_hms_opt(0, 0, 0).map(|t| t - local_now);

    match remaining {
        Some(left) if left.num_seconds() > 0 => {
            let total = left.num_seconds();
            Countdown {
                target,
                days: total / 86_400,
                hours: total % 86_400 / 3_600,
                minutes: total % 3_600 / 60,
                seconds: total % 60,
                passed: false,
            }
        }
        _ => Countdown {
            target,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            passed: true,
        },
    }
}
