//! Work pattern specs: compact minute lists expanded into weekly schedules.
//!
//! A spec is either a keyword or one or more `;`-separated day-lists of
//! comma-separated minutes, Sunday first. A day-list with fewer than seven
//! values is cycled to fill the week:
//!
//! - `standard` is `0,480,480,480,480,480,0`
//! - `rotating_shift` is a two-week rotation alternating 0 and 720 minutes
//! - `0,480` is a fixed week alternating 0 and 480 minutes
//! - `0,480;480,0` is a two-week rotation

use claimgen_core::{DayOfWeek, WorkPattern, WorkPatternDay, WorkPatternType};

use crate::errors::GenerationError;

pub const STANDARD: &str = "standard";
pub const ROTATING_SHIFT: &str = "rotating_shift";

const STANDARD_WEEK: &str = "0,480,480,480,480,480,0";
const MAX_DAY_MINUTES: u32 = 24 * 60;
const ROTATING_SHIFT_MINUTES: u32 = 720;
const ROTATING_SHIFT_WEEKS: usize = 2;

/// Parse a spec into per-week minute arrays, Sunday first.
pub fn parse_weeks(spec: &str) -> Result<Vec<[u32; 7]>, GenerationError> {
    let spec = spec.trim();
    match spec {
        STANDARD => return parse_weeks(STANDARD_WEEK),
        ROTATING_SHIFT => return Ok(rotating_shift_weeks()),
        _ => {}
    }

    spec.split(';').map(parse_day_list).collect()
}

/// Build a work pattern from a spec.
pub fn generate_work_pattern(spec: &str) -> Result<WorkPattern, GenerationError> {
    let weeks = parse_weeks(spec)?;
    let work_pattern_type = if weeks.len() > 1 {
        WorkPatternType::Rotating
    } else {
        WorkPatternType::Fixed
    };
    let work_pattern_days = weeks
        .iter()
        .enumerate()
        .flat_map(|(week_idx, minutes)| {
            DayOfWeek::WEEK
                .iter()
                .zip(minutes.iter())
                .map(move |(day, minutes)| WorkPatternDay {
                    day_of_week: *day,
                    minutes: *minutes,
                    week_number: week_idx as u32 + 1,
                })
        })
        .collect();

    Ok(WorkPattern {
        work_pattern_type,
        work_week_starts: DayOfWeek::Monday,
        work_pattern_days,
    })
}

fn parse_day_list(list: &str) -> Result<[u32; 7], GenerationError> {
    let values = list
        .split(',')
        .map(|value| {
            let value = value.trim();
            let minutes = value.parse::<u32>().map_err(|_| {
                GenerationError::InvalidSpec(format!("work pattern minutes '{value}' is not a number"))
            })?;
            if minutes > MAX_DAY_MINUTES {
                return Err(GenerationError::InvalidSpec(format!(
                    "work pattern minutes {minutes} exceed a day"
                )));
            }
            Ok(minutes)
        })
        .collect::<Result<Vec<u32>, GenerationError>>()?;

    if values.len() > 7 {
        return Err(GenerationError::InvalidSpec(format!(
            "work pattern week '{list}' has more than 7 days"
        )));
    }

    let mut week = [0_u32; 7];
    for (idx, slot) in week.iter_mut().enumerate() {
        *slot = values[idx % values.len()];
    }
    Ok(week)
}

fn rotating_shift_weeks() -> Vec<[u32; 7]> {
    (0..ROTATING_SHIFT_WEEKS)
        .map(|week| {
            let mut minutes = [0_u32; 7];
            for (day, slot) in minutes.iter_mut().enumerate() {
                if (week * 7 + day) % 2 == 1 {
                    *slot = ROTATING_SHIFT_MINUTES;
                }
            }
            minutes
        })
        .collect()
}
