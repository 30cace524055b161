//! Leave window arithmetic against a work pattern.

use chrono::{Datelike, Duration, NaiveDate};
use claimgen_core::{
    ContinuousLeavePeriod, DayOfWeek, IntermittentLeavePeriod, ReducedScheduleLeavePeriod,
    WorkPattern,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::work_pattern::parse_weeks;

/// Maximum days between start and end (strictly under 20 weeks).
pub const MAX_LEAVE_DAYS: i64 = 20 * 7 - 1;
/// Exact window length of a short claim.
pub const SHORT_CLAIM_DAYS: i64 = 7;
/// Latest notification lead time that still counts as short notice.
pub const SHORT_NOTICE_DAYS: i64 = 29;
/// Days back from today where leave may start.
const START_LOOKBACK_DAYS: i64 = 30;
/// Width of the window start dates are drawn from.
const START_WINDOW_DAYS: i64 = 90;

/// Earliest date any generated leave may start.
pub fn minimum_leave_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveDateOptions {
    pub today: NaiveDate,
    pub min_start: NaiveDate,
    /// Force the window to exactly one week.
    pub short_claim: bool,
    /// Minimum distance in days between start and end.
    pub min_days: i64,
}

impl LeaveDateOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            min_start: minimum_leave_start(),
            short_claim: false,
            min_days: 1,
        }
    }

    pub fn short_claim(mut self, short_claim: bool) -> Self {
        self.short_claim = short_claim;
        self
    }

    pub fn min_days(mut self, min_days: i64) -> Self {
        self.min_days = min_days;
        self
    }
}

/// Explicit leave window supplied by a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveDateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub employer_notification_date: NaiveDate,
}

/// Draw a leave window that starts on a working day of `pattern`.
///
/// The start is on or after `options.min_start`, the end is strictly after the
/// start and within 20 weeks of it (exactly 7 days for short claims), and the
/// employer was notified between 1 and 29 days before the start.
pub fn generate_leave_dates(
    pattern: &WorkPattern,
    options: &LeaveDateOptions,
    rng: &mut impl Rng,
) -> Result<LeaveDates, GenerationError> {
    if !DayOfWeek::WEEK.iter().any(|day| pattern.works_on(*day)) {
        return Err(GenerationError::InvalidSpec(
            "work pattern has no working days".to_string(),
        ));
    }

    let earliest = options
        .min_start
        .max(options.today - Duration::days(START_LOOKBACK_DAYS));
    let mut start = earliest + Duration::days(rng.random_range(0..=START_WINDOW_DAYS));
    while !pattern.works_on(DayOfWeek::from(start.weekday())) {
        start += Duration::days(1);
    }

    let days = if options.short_claim {
        if options.min_days > SHORT_CLAIM_DAYS {
            return Err(GenerationError::ConfigConflict(format!(
                "short claim cannot span the required {} days",
                options.min_days
            )));
        }
        SHORT_CLAIM_DAYS
    } else {
        let min = options.min_days.max(1);
        if min > MAX_LEAVE_DAYS {
            return Err(GenerationError::ConfigConflict(format!(
                "leave needs {min} days but may span at most {MAX_LEAVE_DAYS}"
            )));
        }
        rng.random_range(min..=MAX_LEAVE_DAYS)
    };

    Ok(LeaveDates {
        start,
        end: start + Duration::days(days),
        employer_notification_date: start
            - Duration::days(rng.random_range(1..=SHORT_NOTICE_DAYS)),
    })
}

/// Validate an explicit leave window.
pub fn check_range(range: &LeaveDateRange) -> Result<(), GenerationError> {
    if range.end_date <= range.start_date {
        return Err(GenerationError::ConfigConflict(format!(
            "leave_dates end {} is not after start {}",
            range.end_date, range.start_date
        )));
    }
    Ok(())
}

/// Split an inclusive window into `parts` consecutive sub-windows of at least
/// two days each.
pub fn split_window(
    start: NaiveDate,
    end: NaiveDate,
    parts: usize,
) -> Result<Vec<(NaiveDate, NaiveDate)>, GenerationError> {
    if parts <= 1 {
        return Ok(vec![(start, end)]);
    }
    let total = (end - start).num_days() + 1;
    let count = parts as i64;
    if total < count * 2 {
        return Err(GenerationError::ConfigConflict(format!(
            "leave window {start}..{end} is too short for {parts} periods"
        )));
    }

    let base = total / count;
    let remainder = total % count;
    let mut cursor = start;
    let mut windows = Vec::with_capacity(parts);
    for idx in 0..count {
        let len = base + i64::from(idx < remainder);
        let window_end = cursor + Duration::days(len - 1);
        windows.push((cursor, window_end));
        cursor = window_end + Duration::days(1);
    }
    Ok(windows)
}

pub fn continuous_period(start: NaiveDate, end: NaiveDate) -> ContinuousLeavePeriod {
    ContinuousLeavePeriod {
        start_date: start,
        end_date: end,
        is_estimated: true,
    }
}

/// An intermittent period of a few days off, a few times a month.
pub fn intermittent_period(
    start: NaiveDate,
    end: NaiveDate,
    rng: &mut impl Rng,
) -> IntermittentLeavePeriod {
    IntermittentLeavePeriod {
        start_date: start,
        end_date: end,
        duration: rng.random_range(1..=4),
        duration_basis: "Days".to_string(),
        frequency: rng.random_range(1..=6),
        frequency_basis: "Months".to_string(),
        frequency_interval: 1,
        frequency_interval_basis: "Months".to_string(),
    }
}

/// Map a reduction spec onto `pattern` over `start..=end`, one period per
/// rotation week.
///
/// The reduction spec uses the work pattern grammar and must have as many
/// weeks as the pattern; a reduction may not exceed the minutes scheduled on
/// its day.
pub fn reduced_schedule_periods(
    pattern: &WorkPattern,
    reduction_spec: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ReducedScheduleLeavePeriod>, GenerationError> {
    let reductions = parse_weeks(reduction_spec)?;
    let weeks = pattern.weeks() as usize;
    if reductions.len() != weeks {
        return Err(GenerationError::ConfigConflict(format!(
            "reduced leave spec has {} weeks but the work pattern has {weeks}",
            reductions.len()
        )));
    }

    for (week_idx, week) in reductions.iter().enumerate() {
        for (day, reduction) in DayOfWeek::WEEK.iter().zip(week.iter()) {
            let scheduled = pattern.minutes_on(week_idx as u32 + 1, *day);
            if *reduction > scheduled {
                return Err(GenerationError::ConfigConflict(format!(
                    "week {} {day}: reduction of {reduction} minutes exceeds {scheduled} scheduled",
                    week_idx + 1
                )));
            }
        }
    }

    let windows = split_window(start, end, weeks)?;
    Ok(windows
        .into_iter()
        .zip(reductions)
        .map(|((start, end), off)| ReducedScheduleLeavePeriod::from_week(start, end, off))
        .collect())
}
