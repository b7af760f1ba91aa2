use crate::{Result, SnapcostError};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Days in one Gregorian leap cycle starting 2000-01-01 (a leap year).
const REFERENCE_DAYS: usize = 1461;

/// A span of time used for backup intervals, retention windows and cold
/// transitions.
///
/// Fixed spans are an exact number of seconds. Calendar spans count months
/// and are resolved against a date: one month after Jan 31 is the last day of
/// February, and the length of "one month" varies between 28 and 31 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackupDuration {
    Fixed { seconds: i64 },
    Calendar { months: u32 },
}

impl BackupDuration {
    pub const fn seconds(n: i64) -> Self {
        BackupDuration::Fixed { seconds: n }
    }

    pub const fn minutes(n: i64) -> Self {
        BackupDuration::Fixed { seconds: n * MINUTE }
    }

    pub const fn hours(n: i64) -> Self {
        BackupDuration::Fixed { seconds: n * HOUR }
    }

    pub const fn days(n: i64) -> Self {
        BackupDuration::Fixed { seconds: n * DAY }
    }

    pub const fn weeks(n: i64) -> Self {
        BackupDuration::Fixed { seconds: n * WEEK }
    }

    pub const fn months(n: u32) -> Self {
        BackupDuration::Calendar { months: n }
    }

    pub const fn years(n: u32) -> Self {
        BackupDuration::Calendar { months: n * 12 }
    }

    pub fn is_positive(&self) -> bool {
        match *self {
            BackupDuration::Fixed { seconds } => seconds > 0,
            BackupDuration::Calendar { months } => months > 0,
        }
    }

    pub fn is_calendar(&self) -> bool {
        matches!(self, BackupDuration::Calendar { .. })
    }

    /// Returns `at + times × self`, or `None` on overflow.
    ///
    /// Calendar steps are applied to `at` in a single jump, so clamping to the
    /// end of a short month never carries over into later occurrences.
    pub fn add_times(&self, at: NaiveDateTime, times: i64) -> Option<NaiveDateTime> {
        match *self {
            BackupDuration::Fixed { seconds } => {
                let total = seconds.checked_mul(times)?;
                at.checked_add_signed(TimeDelta::try_seconds(total)?)
            }
            BackupDuration::Calendar { months } => {
                let total = i64::from(months).checked_mul(times)?;
                let step = Months::new(u32::try_from(total.unsigned_abs()).ok()?);
                if total >= 0 {
                    at.checked_add_months(step)
                } else {
                    at.checked_sub_months(step)
                }
            }
        }
    }

    pub fn after(&self, at: NaiveDateTime) -> Result<NaiveDateTime> {
        self.add_times(at, 1)
            .ok_or_else(|| SnapcostError::DateOutOfRange(format!("{at} + {self}")))
    }

    pub fn before(&self, at: NaiveDateTime) -> Result<NaiveDateTime> {
        self.add_times(at, -1)
            .ok_or_else(|| SnapcostError::DateOutOfRange(format!("{at} - {self}")))
    }

    /// Number of whole steps from `anchor` to `target`, rounded towards
    /// negative infinity. For calendar spans the day of month is ignored, so
    /// the result can be one step too high; callers step back once more.
    pub fn steps_between(&self, anchor: NaiveDateTime, target: NaiveDateTime) -> i64 {
        match *self {
            BackupDuration::Fixed { seconds } => {
                let elapsed = (target - anchor).num_seconds();
                elapsed.div_euclid(seconds.max(1))
            }
            BackupDuration::Calendar { months } => {
                let elapsed = i64::from(target.year() - anchor.year()) * 12
                    + i64::from(target.month()) - i64::from(anchor.month());
                elapsed.div_euclid(i64::from(months.max(1)))
            }
        }
    }

    /// Length in seconds when started at `at`.
    pub fn span_from(&self, at: NaiveDateTime) -> Option<i64> {
        self.add_times(at, 1).map(|end| (end - at).num_seconds())
    }

    /// Shortest and longest length in seconds over every start date of a leap
    /// cycle. Both are equal for fixed spans.
    pub fn span_bounds(&self) -> (i64, i64) {
        match *self {
            BackupDuration::Fixed { seconds } => (seconds, seconds),
            BackupDuration::Calendar { .. } => reference_instants()
                .filter_map(|at| self.span_from(at))
                .fold((i64::MAX, i64::MIN), |(lo, hi), span| {
                    (lo.min(span), hi.max(span))
                }),
        }
    }

    /// True when `self` is strictly shorter than `other` for every possible
    /// start date.
    pub fn always_shorter_than(&self, other: &BackupDuration) -> bool {
        match (*self, *other) {
            (BackupDuration::Fixed { seconds: a }, BackupDuration::Fixed { seconds: b }) => a < b,
            (BackupDuration::Calendar { months: a }, BackupDuration::Calendar { months: b }) => {
                a < b
            }
            _ => reference_instants().all(|at| match (self.span_from(at), other.span_from(at)) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            }),
        }
    }
}

fn reference_instants() -> impl Iterator<Item = NaiveDateTime> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .into_iter()
        .flat_map(|start| start.iter_days().take(REFERENCE_DAYS))
        .map(|day| day.and_time(NaiveTime::MIN))
}

impl fmt::Display for BackupDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BackupDuration::Fixed { seconds } if seconds != 0 && seconds % WEEK == 0 => {
                write!(f, "{}w", seconds / WEEK)
            }
            BackupDuration::Fixed { seconds } if seconds != 0 && seconds % DAY == 0 => {
                write!(f, "{}d", seconds / DAY)
            }
            BackupDuration::Fixed { seconds } if seconds != 0 && seconds % HOUR == 0 => {
                write!(f, "{}h", seconds / HOUR)
            }
            BackupDuration::Fixed { seconds } if seconds != 0 && seconds % MINUTE == 0 => {
                write!(f, "{}min", seconds / MINUTE)
            }
            BackupDuration::Fixed { seconds } => write!(f, "{seconds}s"),
            BackupDuration::Calendar { months } if months != 0 && months % 12 == 0 => {
                write!(f, "{}y", months / 12)
            }
            BackupDuration::Calendar { months } => write!(f, "{months}mo"),
        }
    }
}

impl FromStr for BackupDuration {
    type Err = SnapcostError;

    /// Parses `<n><unit>` where unit is one of `s`, `min`, `h`, `d`, `w`
    /// (fixed) or `mo`, `y` (calendar).
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_lowercase();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| {
                SnapcostError::InvalidDuration(format!(
                    "'{s}' has no unit (use s, min, h, d, w, mo or y)"
                ))
            })?;
        let (digits, unit) = text.split_at(split);

        let value: u32 = digits.parse().map_err(|_| {
            SnapcostError::InvalidDuration(format!("'{s}' must start with a whole number"))
        })?;
        if value == 0 {
            return Err(SnapcostError::InvalidDuration(format!(
                "'{s}' must be greater than zero"
            )));
        }

        let n = i64::from(value);
        match unit.trim() {
            "s" => Ok(Self::seconds(n)),
            "min" => Ok(Self::minutes(n)),
            "h" => Ok(Self::hours(n)),
            "d" => Ok(Self::days(n)),
            "w" => Ok(Self::weeks(n)),
            "mo" => Ok(Self::months(value)),
            "y" => value
                .checked_mul(12)
                .map(Self::months)
                .ok_or_else(|| SnapcostError::InvalidDuration(format!("'{s}' is too long"))),
            other => Err(SnapcostError::InvalidDuration(format!(
                "unknown unit '{other}' in '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for BackupDuration {
    type Error = SnapcostError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BackupDuration> for String {
    fn from(value: BackupDuration) -> Self {
        value.to_string()
    }
}
