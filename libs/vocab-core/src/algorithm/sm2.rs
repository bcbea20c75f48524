//! Modified SM-2 scheduler.
//!
//! Differences from SuperMemo 2: the first two successful reviews get
//! grade-tiered intervals instead of the fixed 1 and 6 days, and due times are
//! pinned to the start of a study day (04:00 local) instead of the moment of
//! review.

use super::SchedulingResult;
use crate::types::{INITIAL_EFACTOR, MINIMUM_EFACTOR};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Hour of the local day at which every due time lands.
pub const STUDY_DAY_START_HOUR: u32 = 4;

/// Upper bound on a single interval, about a century.
pub const MAXIMUM_INTERVAL_DAYS: i64 = 36_500;

/// Compute the next scheduling state of a term after a review.
///
/// Never fails. A non-finite easiness factor is treated as the initial 2.5 and
/// negative counters as 0, so a corrupted record still gets a valid schedule.
/// `now` is only used for `next_review_at`; its time zone decides what "04:00"
/// means.
pub fn compute_next_review<Tz: TimeZone>(
    grade: u8,
    previous_repetition: i64,
    previous_efactor: f64,
    previous_interval: i64,
    now: &DateTime<Tz>,
) -> SchedulingResult {
    let previous_repetition = previous_repetition.max(0);
    let previous_interval = previous_interval.max(0);
    let previous_efactor = if previous_efactor.is_finite() {
        previous_efactor
    } else {
        INITIAL_EFACTOR
    };

    let (interval, repetition) = if grade >= 3 {
        let interval = match previous_repetition {
            0 => match grade {
                5 => 4,
                4 => 2,
                _ => 1,
            },
            1 => match grade {
                5 => 10,
                4 => 6,
                _ => 4,
            },
            _ => (previous_interval as f64 * previous_efactor).round() as i64,
        };
        (interval, previous_repetition + 1)
    } else {
        (1, 0)
    };
    let interval = interval.clamp(1, MAXIMUM_INTERVAL_DAYS);

    let q = 5.0 - f64::from(grade);
    let efactor = (previous_efactor + (0.1 - q * (0.08 + q * 0.02))).max(MINIMUM_EFACTOR);

    SchedulingResult {
        interval,
        repetition,
        efactor,
        next_review_at: study_day_start(now, interval),
    }
}

/// 04:00 local time, `days` calendar days after `now`.
fn study_day_start<Tz: TimeZone>(now: &DateTime<Tz>, days: i64) -> DateTime<Utc> {
    let fallback = || now.with_timezone(&Utc) + Duration::days(days);

    let Some(date) = now.date_naive().checked_add_days(Days::new(days as u64)) else {
        return fallback();
    };
    let Some(start) = local_start(date) else {
        return fallback();
    };

    let tz = now.timezone();
    // Skip forward through a DST gap, one hour at a time.
    (0..24)
        .find_map(|hours| {
            tz.from_local_datetime(&(start + Duration::hours(hours)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(fallback)
}

fn local_start(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(STUDY_DAY_START_HOUR, 0, 0)
}
