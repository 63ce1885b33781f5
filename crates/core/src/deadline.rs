use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Days, Local, Months, TimeZone, Utc};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetUnit {
    Days,
    Weeks,
    Months,
}

impl OffsetUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetUnit::Days => "days",
            OffsetUnit::Weeks => "weeks",
            OffsetUnit::Months => "months",
        }
    }
}

impl fmt::Display for OffsetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OffsetUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "day" | "days" => Ok(OffsetUnit::Days),
            "w" | "week" | "weeks" => Ok(OffsetUnit::Weeks),
            "m" | "month" | "months" => Ok(OffsetUnit::Months),
            other => Err(anyhow!(
                "Unknown unit '{}': expected days|weeks|months",
                other
            )),
        }
    }
}

impl ValueEnum for OffsetUnit {
    fn value_variants<'a>() -> &'a [Self] {
        const VARIANTS: [OffsetUnit; 3] = [OffsetUnit::Days, OffsetUnit::Weeks, OffsetUnit::Months];
        &VARIANTS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Wall-clock time at which a deadline falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static TIME_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid regex"));

        let trimmed = s.trim();
        let captures = TIME_RE
            .captures(trimmed)
            .ok_or_else(|| ValidationError::UnparsableTime(s.to_string()))?;
        let hour = captures[1]
            .parse::<u32>()
            .map_err(|_| ValidationError::UnparsableTime(s.to_string()))?;
        let minute = captures[2]
            .parse::<u32>()
            .map_err(|_| ValidationError::UnparsableTime(s.to_string()))?;
        TimeOfDay::new(hour, minute)
    }
}

/// Relative deadline as entered by a user: "in `amount` `unit` at `time`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineInput {
    pub amount: u32,
    pub unit: OffsetUnit,
    pub time: TimeOfDay,
}

impl Default for DeadlineInput {
    fn default() -> Self {
        Self {
            amount: 3,
            unit: OffsetUnit::Days,
            time: TimeOfDay::default(),
        }
    }
}

impl DeadlineInput {
    pub fn new(amount: u32, unit: OffsetUnit, time: TimeOfDay) -> Self {
        Self { amount, unit, time }
    }

    /// Resolve to an absolute instant: the calendar date of `now` in its own
    /// zone, shifted by the offset, at the requested local time.
    pub fn resolve<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<DateTime<Utc>, ValidationError> {
        let today = now.date_naive();
        let date = match self.unit {
            OffsetUnit::Days => today.checked_add_days(Days::new(u64::from(self.amount))),
            OffsetUnit::Weeks => today.checked_add_days(Days::new(u64::from(self.amount) * 7)),
            OffsetUnit::Months => today.checked_add_months(Months::new(self.amount)),
        }
        .ok_or_else(|| ValidationError::DeadlineOutOfRange {
            amount: self.amount,
            unit: self.unit.to_string(),
        })?;

        let invalid_time = || ValidationError::InvalidTime {
            hour: self.time.hour,
            minute: self.time.minute,
        };
        let naive = date
            .and_hms_opt(self.time.hour, self.time.minute, 0)
            .ok_or_else(invalid_time)?;
        let deadline = now
            .timezone()
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(invalid_time)?
            .with_timezone(&Utc);

        if deadline <= now.with_timezone(&Utc) {
            return Err(ValidationError::DeadlineInPast(
                naive.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }
        Ok(deadline)
    }

    /// Resolve against the clock, reading calendar dates in the local zone.
    pub fn resolve_local(&self, clock: &dyn Clock) -> Result<DateTime<Utc>, ValidationError> {
        self.resolve(&clock.now().with_timezone(&Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[rstest]
    #[case(3, OffsetUnit::Days, utc(2025, 1, 18, 18, 0))]
    #[case(2, OffsetUnit::Weeks, utc(2025, 1, 29, 18, 0))]
    #[case(1, OffsetUnit::Months, utc(2025, 2, 15, 18, 0))]
    fn resolves_relative_offsets(
        #[case] amount: u32,
        #[case] unit: OffsetUnit,
        #[case] expected: DateTime<Utc>,
    ) {
        let now = utc(2025, 1, 15, 10, 30);
        let input = DeadlineInput::new(amount, unit, TimeOfDay::new(18, 0).unwrap());
        assert_eq!(input.resolve(&now).unwrap(), expected);
    }

    #[test]
    fn month_offset_clamps_to_month_end() {
        let now = utc(2025, 1, 31, 8, 0);
        let input = DeadlineInput::new(1, OffsetUnit::Months, TimeOfDay::new(9, 0).unwrap());
        assert_eq!(input.resolve(&now).unwrap(), utc(2025, 2, 28, 9, 0));
    }

    #[test]
    fn same_day_deadline_must_be_in_the_future() {
        let now = utc(2025, 1, 15, 10, 30);
        let earlier = DeadlineInput::new(0, OffsetUnit::Days, TimeOfDay::new(10, 30).unwrap());
        assert!(matches!(
            earlier.resolve(&now),
            Err(ValidationError::DeadlineInPast(_))
        ));

        let later = DeadlineInput::new(0, OffsetUnit::Days, TimeOfDay::new(10, 31).unwrap());
        assert_eq!(later.resolve(&now).unwrap(), utc(2025, 1, 15, 10, 31));
    }

    #[test]
    fn resolves_in_the_zone_of_now() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2025, 6, 10, 23, 30, 0).unwrap();
        let input = DeadlineInput::new(0, OffsetUnit::Days, TimeOfDay::new(23, 45).unwrap());
        assert_eq!(input.resolve(&now).unwrap(), utc(2025, 6, 10, 21, 45));
    }

    #[rstest]
    #[case("7:05", 7, 5)]
    #[case("18:30", 18, 30)]
    #[case(" 00:00 ", 0, 0)]
    fn parses_time_of_day(#[case] raw: &str, #[case] hour: u32, #[case] minute: u32) {
        let time: TimeOfDay = raw.parse().unwrap();
        assert_eq!((time.hour(), time.minute()), (hour, minute));
    }

    #[test]
    fn rejects_out_of_range_and_garbled_times() {
        assert_eq!(
            "24:00".parse::<TimeOfDay>(),
            Err(ValidationError::InvalidTime {
                hour: 24,
                minute: 0
            })
        );
        assert_eq!(
            "12:60".parse::<TimeOfDay>(),
            Err(ValidationError::InvalidTime {
                hour: 12,
                minute: 60
            })
        );
        assert!(matches!(
            "noon".parse::<TimeOfDay>(),
            Err(ValidationError::UnparsableTime(_))
        ));
    }

    #[test]
    fn default_input_is_three_days_at_nine() {
        let input = DeadlineInput::default();
        assert_eq!(input.amount, 3);
        assert_eq!(input.unit, OffsetUnit::Days);
        assert_eq!(input.time.to_string(), "09:00");
    }

    #[test]
    fn unit_parses_short_and_long_forms() {
        assert_eq!("w".parse::<OffsetUnit>().unwrap(), OffsetUnit::Weeks);
        assert_eq!("Months".parse::<OffsetUnit>().unwrap(), OffsetUnit::Months);
        assert!("fortnight".parse::<OffsetUnit>().is_err());
    }
}
