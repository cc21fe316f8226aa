//! Recurrence rule model.
//!
//! A [`RecurrenceRule`] is the schedule template: a repetition mode with its
//! mode-specific configuration, a termination policy, and the cursor state
//! the expansion flow advances. Configuration that only applies to one mode
//! lives inside that mode's variant, so a rule carrying the wrong
//! configuration for its mode cannot be constructed.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::types::TemplateSnapshot;

use crate::error::{RecurError, RecurResult};

/// Day of the week.
///
/// Weekday numbering is ISO-like (1 = Monday .. 7 = Sunday) everywhere
/// inside the engine; the 0 = Sunday convention exists only at the calendar
/// oracle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Parses a weekday from its lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "monday" => Self::Monday,
            "tuesday" => Self::Tuesday,
            "wednesday" => Self::Wednesday,
            "thursday" => Self::Thursday,
            "friday" => Self::Friday,
            "saturday" => Self::Saturday,
            "sunday" => Self::Sunday,
            _ => return None,
        })
    }

    /// Returns all weekdays in ISO order (Monday through Sunday).
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }

    /// ISO weekday number (1 = Monday .. 7 = Sunday).
    #[must_use]
    pub const fn iso_number(self) -> u32 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }

    /// Parses an ISO weekday number (1 = Monday .. 7 = Sunday).
    #[must_use]
    pub const fn from_iso(n: u32) -> Option<Self> {
        Some(match n {
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            7 => Self::Sunday,
            _ => return None,
        })
    }

    /// Sunday-zero index (0 = Sunday .. 6 = Saturday).
    ///
    /// Regional holiday tables are commonly indexed this way; use only at
    /// the oracle boundary.
    #[must_use]
    pub const fn sunday_index(self) -> u32 {
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

    /// Parses a Sunday-zero index (0 = Sunday .. 6 = Saturday).
    #[must_use]
    pub const fn from_sunday_index(n: u32) -> Option<Self> {
        Some(match n {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            _ => return None,
        })
    }

    /// True for Saturday and Sunday.
    #[must_use]
    pub const fn is_weekend(self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(wd: chrono::Weekday) -> Self {
        match wd {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(wd: Weekday) -> Self {
        match wd {
            Weekday::Monday => Self::Mon,
            Weekday::Tuesday => Self::Tue,
            Weekday::Wednesday => Self::Wed,
            Weekday::Thursday => Self::Thu,
            Weekday::Friday => Self::Fri,
            Weekday::Saturday => Self::Sat,
            Weekday::Sunday => Self::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a day within its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
    SecondLast,
}

impl Ordinal {
    /// Zero-based offset from the first match, for the forward ordinals.
    ///
    /// Returns `None` for [`Ordinal::Last`] and [`Ordinal::SecondLast`],
    /// which count backward from month end.
    #[must_use]
    pub const fn forward_offset(self) -> Option<u32> {
        match self {
            Self::First => Some(0),
            Self::Second => Some(1),
            Self::Third => Some(2),
            Self::Fourth => Some(3),
            Self::Last | Self::SecondLast => None,
        }
    }
}

/// Which kind of day an ordinal-day rule counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    /// Plain calendar days.
    Calendar,
    /// Workdays per the calendar oracle.
    Workday,
    /// Rest days per the calendar oracle.
    RestDay,
}

/// Configuration for weekly repetition: which weekdays the rule fires on.
///
/// An empty set is a configuration gap, not an error; evaluation falls back
/// to a fixed seven-day advance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyConfig {
    pub weekdays: Vec<Weekday>,
}

impl WeeklyConfig {
    /// Creates a weekly configuration firing on the given weekdays.
    #[must_use]
    pub fn on(weekdays: Vec<Weekday>) -> Self {
        Self { weekdays }
    }

    /// True if the set contains the given weekday.
    #[must_use]
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday)
    }
}

/// Configuration for monthly repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum MonthlyConfig {
    /// A fixed day of the month (1-31), clamped to the month's length.
    DayOfMonth { day: u32 },
    /// The nth occurrence of a weekday, e.g. third Thursday.
    NthWeekday { nth: Ordinal, weekday: Weekday },
    /// The nth day of a given kind, e.g. second-last rest day.
    NthDay { nth: Ordinal, kind: DayKind },
}

/// Configuration for yearly repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum YearlyConfig {
    /// A day within a fixed target month (1-12).
    MonthAndDay { month: u32, day: MonthlyConfig },
    /// The nth occurrence of a weekday within the anchor's own month.
    NthWeekday { nth: Ordinal, weekday: Weekday },
}

/// Step unit for custom intervals, with an optional refinement picking the
/// exact day within the period the step lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "refine", rename_all = "snake_case")]
pub enum CustomStep {
    Days,
    Weeks(Option<WeeklyConfig>),
    Months(Option<MonthlyConfig>),
    Years(Option<YearlyConfig>),
}

/// Configuration for compound custom intervals, e.g. "every 2 weeks, on
/// Monday" or "every 3 months, on the last workday".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConfig {
    /// Interval length in `step` units. Zero is a configuration gap and
    /// evaluates as one.
    pub every: u32,
    pub step: CustomStep,
}

/// How a schedule repeats.
///
/// Mode-specific configuration lives inside the variant; modes without a
/// payload need none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "config", rename_all = "snake_case")]
pub enum RecurrenceMode {
    /// Terminal: never produces a next occurrence.
    None,
    Daily,
    Weekly(WeeklyConfig),
    Monthly(MonthlyConfig),
    Yearly(YearlyConfig),
    /// Monday through Friday, skipping weekends.
    Weekdays,
    /// Saturday and Sunday only.
    Weekend,
    /// Workdays per the calendar oracle, holiday-aware.
    Workdays,
    /// Rest days per the calendar oracle, holiday-aware.
    RestDay,
    Custom(CustomConfig),
}

impl RecurrenceMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly(_) => "weekly",
            Self::Monthly(_) => "monthly",
            Self::Yearly(_) => "yearly",
            Self::Weekdays => "weekdays",
            Self::Weekend => "weekend",
            Self::Workdays => "workdays",
            Self::RestDay => "rest_day",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for RecurrenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a recurring schedule stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EndPolicy {
    /// Unbounded.
    Forever,
    /// A fixed total number of occurrences across the rule's lifetime.
    ForTimes(u32),
    /// A fixed last date (inclusive).
    ToDate(NaiveDate),
}

/// A recurring schedule template.
///
/// The rule owns the cursor bookmarking the last date it was advanced to.
/// Only the expansion flow moves the cursor, and only forward; the engine
/// returns the advanced value for the caller to persist rather than
/// mutating the rule in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Template identity; generated occurrences reference it.
    pub id: Uuid,
    /// Display fields copied onto every generated occurrence.
    pub template: TemplateSnapshot,
    pub mode: RecurrenceMode,
    pub end_policy: EndPolicy,
    /// First valid anchor date.
    pub start_date: NaiveDate,
    /// Last date the rule was advanced to. A fresh rule starts one day
    /// before `start_date` so the first evaluation can land on it.
    pub cursor_date: NaiveDate,
    /// Occurrence slots already consumed, for [`EndPolicy::ForTimes`].
    pub occurrences_emitted: u32,
}

impl RecurrenceRule {
    /// Creates a fresh rule with the cursor primed one day before the start
    /// date and an unbounded end policy.
    #[must_use]
    pub fn new(template: TemplateSnapshot, mode: RecurrenceMode, start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            template,
            mode,
            end_policy: EndPolicy::Forever,
            start_date,
            cursor_date: start_date.pred_opt().unwrap_or(start_date),
            occurrences_emitted: 0,
        }
    }

    /// Sets the end policy.
    #[must_use]
    pub const fn with_end_policy(mut self, end_policy: EndPolicy) -> Self {
        self.end_policy = end_policy;
        self
    }

    /// Restores cursor state persisted by a previous expansion pass.
    #[must_use]
    pub const fn with_state(mut self, cursor_date: NaiveDate, occurrences_emitted: u32) -> Self {
        self.cursor_date = cursor_date;
        self.occurrences_emitted = occurrences_emitted;
        self
    }

    /// Validates field ranges and cross-field invariants.
    ///
    /// Configuration gaps with a documented evaluation fallback (an empty
    /// weekly set) pass validation; impossible values (day 32, month 13) do
    /// not.
    ///
    /// ## Errors
    /// Returns [`RecurError::InvalidRule`] describing the first violation
    /// found, or a core validation error from the template snapshot.
    pub fn validate(&self) -> RecurResult<()> {
        self.template.validate()?;

        if let Some(primed) = self.start_date.pred_opt()
            && self.cursor_date < primed
        {
            return Err(RecurError::InvalidRule(format!(
                "cursor {} sits before the rule's primed start {primed}",
                self.cursor_date
            )));
        }

        match self.end_policy {
            EndPolicy::ForTimes(0) => {
                return Err(RecurError::InvalidRule(
                    "occurrence limit must be at least 1".to_string(),
                ));
            }
            EndPolicy::ToDate(d) if d < self.start_date => {
                return Err(RecurError::InvalidRule(format!(
                    "end date {d} precedes start date {}",
                    self.start_date
                )));
            }
            _ => {}
        }

        validate_mode(&self.mode)
    }
}

fn validate_mode(mode: &RecurrenceMode) -> RecurResult<()> {
    match mode {
        RecurrenceMode::Monthly(m) => validate_monthly(*m),
        RecurrenceMode::Yearly(y) => validate_yearly(*y),
        RecurrenceMode::Custom(c) => {
            // A zero interval is a gap, not an error; evaluation clamps it
            // to one.
            match &c.step {
                CustomStep::Months(Some(m)) => validate_monthly(*m),
                CustomStep::Years(Some(y)) => validate_yearly(*y),
                _ => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

fn validate_monthly(config: MonthlyConfig) -> RecurResult<()> {
    if let MonthlyConfig::DayOfMonth { day } = config
        && !(1..=31).contains(&day)
    {
        return Err(RecurError::InvalidRule(format!(
            "day of month must be 1-31, got {day}"
        )));
    }
    Ok(())
}

fn validate_yearly(config: YearlyConfig) -> RecurResult<()> {
    if let YearlyConfig::MonthAndDay { month, day } = config {
        if !(1..=12).contains(&month) {
            return Err(RecurError::InvalidRule(format!(
                "month must be 1-12, got {month}"
            )));
        }
        validate_monthly(day)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TemplateSnapshot {
        TemplateSnapshot::new("Weekly review")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_iso_round_trip() {
        for wd in Weekday::all() {
            assert_eq!(Weekday::from_iso(wd.iso_number()), Some(wd));
            assert_eq!(Weekday::from_sunday_index(wd.sunday_index()), Some(wd));
            assert_eq!(Weekday::from(chrono::Weekday::from(wd)), wd);
        }
        assert_eq!(Weekday::from_iso(0), None);
        assert_eq!(Weekday::from_iso(8), None);
        assert_eq!(Weekday::from_sunday_index(7), None);
    }

    #[test]
    fn weekday_parse() {
        assert_eq!(Weekday::parse("monday"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse("FRIDAY"), Some(Weekday::Friday));
        assert_eq!(Weekday::parse("noday"), None);
    }

    #[test]
    fn fresh_rule_primes_cursor_before_start() {
        let rule = RecurrenceRule::new(template(), RecurrenceMode::Daily, date(2023, 6, 15));
        assert_eq!(rule.cursor_date, date(2023, 6, 14));
        assert_eq!(rule.occurrences_emitted, 0);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn zero_occurrence_limit_rejected() {
        let rule = RecurrenceRule::new(template(), RecurrenceMode::Daily, date(2023, 6, 15))
            .with_end_policy(EndPolicy::ForTimes(0));
        assert!(matches!(rule.validate(), Err(RecurError::InvalidRule(_))));
    }

    #[test]
    fn end_date_before_start_rejected() {
        let rule = RecurrenceRule::new(template(), RecurrenceMode::Daily, date(2023, 6, 15))
            .with_end_policy(EndPolicy::ToDate(date(2023, 6, 1)));
        assert!(rule.validate().is_err());
    }

    #[test]
    fn day_of_month_out_of_range_rejected() {
        let mode = RecurrenceMode::Monthly(MonthlyConfig::DayOfMonth { day: 32 });
        let rule = RecurrenceRule::new(template(), mode, date(2023, 1, 1));
        assert!(rule.validate().is_err());
    }

    #[test]
    fn yearly_month_out_of_range_rejected() {
        let mode = RecurrenceMode::Yearly(YearlyConfig::MonthAndDay {
            month: 13,
            day: MonthlyConfig::DayOfMonth { day: 1 },
        });
        let rule = RecurrenceRule::new(template(), mode, date(2023, 1, 1));
        assert!(rule.validate().is_err());
    }

    #[test]
    fn empty_weekly_set_passes_validation() {
        let mode = RecurrenceMode::Weekly(WeeklyConfig::default());
        let rule = RecurrenceRule::new(template(), mode, date(2023, 1, 1));
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn mode_blob_is_keyed_by_mode() {
        let mode = RecurrenceMode::Monthly(MonthlyConfig::NthWeekday {
            nth: Ordinal::Third,
            weekday: Weekday::Thursday,
        });
        let blob = serde_json::to_value(&mode).unwrap();
        assert_eq!(blob["mode"], "monthly");
        assert_eq!(blob["config"]["by"], "nth_weekday");
        assert_eq!(blob["config"]["nth"], "third");
        assert_eq!(blob["config"]["weekday"], "thursday");

        let back: RecurrenceMode = serde_json::from_value(blob).unwrap();
        assert_eq!(back, mode);
    }

    #[test]
    fn unit_mode_blob_has_no_config() {
        let blob = serde_json::to_value(RecurrenceMode::Weekdays).unwrap();
        assert_eq!(blob["mode"], "weekdays");
        assert!(blob.get("config").is_none());
    }

    #[test]
    fn end_policy_blob_round_trip() {
        let policy = EndPolicy::ToDate(date(2024, 12, 31));
        let blob = serde_json::to_value(policy).unwrap();
        assert_eq!(blob["kind"], "to_date");
        let back: EndPolicy = serde_json::from_value(blob).unwrap();
        assert_eq!(back, policy);
    }
}
