use std::fmt;

use chrono::Weekday;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Day of the week as spelled in claim payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    /// Positional order of day-lists in work pattern specs.
    pub const WEEK: [DayOfWeek; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }

    /// Index into [`DayOfWeek::WEEK`].
    pub fn index(self) -> usize {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Sun => Self::Sunday,
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum WorkPatternType {
    Fixed,
    Rotating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkPatternDay {
    pub day_of_week: DayOfWeek,
    pub minutes: u32,
    /// 1-indexed week of the rotation.
    pub week_number: u32,
}

/// Weekly (or multi-week rotating) schedule of worked minutes per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkPattern {
    pub work_pattern_type: WorkPatternType,
    pub work_week_starts: DayOfWeek,
    pub work_pattern_days: Vec<WorkPatternDay>,
}

impl WorkPattern {
    pub fn weeks(&self) -> u32 {
        self.work_pattern_days
            .iter()
            .map(|day| day.week_number)
            .max()
            .unwrap_or(0)
    }

    /// Days of one rotation week, in Sunday-first order.
    pub fn week(&self, week_number: u32) -> impl Iterator<Item = &WorkPatternDay> {
        self.work_pattern_days
            .iter()
            .filter(move |day| day.week_number == week_number)
    }

    /// Whether `day` has worked minutes in any week of the rotation.
    pub fn works_on(&self, day: DayOfWeek) -> bool {
        self.work_pattern_days
            .iter()
            .any(|entry| entry.day_of_week == day && entry.minutes > 0)
    }

    pub fn minutes_on(&self, week_number: u32, day: DayOfWeek) -> u32 {
        self.work_pattern_days
            .iter()
            .find(|entry| entry.week_number == week_number && entry.day_of_week == day)
            .map(|entry| entry.minutes)
            .unwrap_or(0)
    }

    /// Average weekly hours across the rotation.
    pub fn hours_per_week(&self) -> f64 {
        let weeks = self.weeks();
        if weeks == 0 {
            return 0.0;
        }
        let minutes: u32 = self.work_pattern_days.iter().map(|day| day.minutes).sum();
        minutes as f64 / 60.0 / weeks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(minutes: [u32; 7]) -> WorkPattern {
        WorkPattern {
            work_pattern_type: WorkPatternType::Fixed,
            work_week_starts: DayOfWeek::Monday,
            work_pattern_days: DayOfWeek::WEEK
                .iter()
                .zip(minutes)
                .map(|(day, minutes)| WorkPatternDay {
                    day_of_week: *day,
                    minutes,
                    week_number: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn hours_per_week_sums_minutes() {
        let pattern = fixed([0, 480, 480, 480, 480, 480, 0]);
        assert_eq!(pattern.hours_per_week(), 40.0);
        assert!(pattern.works_on(DayOfWeek::Friday));
        assert!(!pattern.works_on(DayOfWeek::Sunday));
    }

    #[test]
    fn day_of_week_serializes_full_name() {
        let json = serde_json::to_string(&DayOfWeek::Thursday).unwrap();
        assert_eq!(json, "\"Thursday\"");
        assert_eq!(DayOfWeek::from(Weekday::Sat), DayOfWeek::Saturday);
    }
}
