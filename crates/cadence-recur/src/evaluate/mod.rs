//! Next-occurrence evaluation.
//!
//! [`RuleEvaluator`] maps `(anchor, rule)` to the next calendar date the
//! rule fires on. Evaluation is pure and total: every mode except
//! [`RecurrenceMode::None`] produces a concrete date, incomplete
//! configuration resolves through documented fallbacks, and month/day
//! arithmetic can never construct an invalid date. The only failure source
//! is the injected calendar oracle, whose errors pass through unmodified.

use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::CalendarOracle;
use crate::error::RecurResult;
use crate::rule::{
    CustomConfig, CustomStep, DayKind, MonthlyConfig, Ordinal, RecurrenceMode, RecurrenceRule,
    Weekday, WeeklyConfig, YearlyConfig,
};

/// Computes the next occurrence of a recurrence rule.
///
/// Borrows the calendar oracle for the workday/rest-day modes; everything
/// else evaluates without it.
pub struct RuleEvaluator<'a, C: CalendarOracle> {
    calendar: &'a C,
}

impl<'a, C: CalendarOracle> RuleEvaluator<'a, C> {
    /// Creates an evaluator backed by the given calendar.
    #[must_use]
    pub const fn new(calendar: &'a C) -> Self {
        Self { calendar }
    }

    /// Returns the next date the rule fires on, strictly after `anchor`.
    ///
    /// Returns `Ok(None)` only for [`RecurrenceMode::None`]; every other
    /// mode terminates with a concrete date.
    ///
    /// ## Errors
    /// Returns an error only when the calendar oracle fails a lookup the
    /// rule's mode requires.
    pub fn next_occurrence(
        &self,
        anchor: NaiveDate,
        rule: &RecurrenceRule,
    ) -> RecurResult<Option<NaiveDate>> {
        let next = match &rule.mode {
            RecurrenceMode::None => return Ok(None),
            RecurrenceMode::Daily => anchor + Days::new(1),
            RecurrenceMode::Weekdays => skip_weekend_forward(anchor + Days::new(1)),
            RecurrenceMode::Weekend => advance_to_weekend(anchor + Days::new(1)),
            RecurrenceMode::Workdays => self.calendar.next_workday(anchor)?,
            RecurrenceMode::RestDay => self.calendar.next_rest_day(anchor)?,
            RecurrenceMode::Weekly(config) => next_in_weekday_set(anchor, config),
            RecurrenceMode::Monthly(config) => {
                let (year, month) = month_after(anchor);
                self.resolve_in_month(year, month, *config)?
            }
            RecurrenceMode::Yearly(config) => {
                self.resolve_in_year(anchor.year() + 1, anchor.month(), *config)?
            }
            RecurrenceMode::Custom(config) => self.next_custom(anchor, config)?,
        };
        Ok(Some(next))
    }

    /// Resolves a monthly variant to a concrete day of the given month.
    fn resolve_in_month(
        &self,
        year: i32,
        month: u32,
        config: MonthlyConfig,
    ) -> RecurResult<NaiveDate> {
        match config {
            MonthlyConfig::DayOfMonth { day } => Ok(ymd_clamped(year, month, day)),
            MonthlyConfig::NthWeekday { nth, weekday } => {
                Ok(nth_weekday_in_month(year, month, nth, weekday))
            }
            MonthlyConfig::NthDay { nth, kind } => match kind {
                DayKind::Calendar => Ok(nth_calendar_day(year, month, nth)),
                DayKind::Workday | DayKind::RestDay => self.nth_oracle_day(year, month, nth, kind),
            },
        }
    }

    /// Resolves a yearly variant within the given year. `anchor_month` is
    /// the month the ordinal-weekday variant stays in.
    fn resolve_in_year(
        &self,
        year: i32,
        anchor_month: u32,
        config: YearlyConfig,
    ) -> RecurResult<NaiveDate> {
        match config {
            YearlyConfig::MonthAndDay { month, day } => {
                self.resolve_in_month(year, month.clamp(1, 12), day)
            }
            YearlyConfig::NthWeekday { nth, weekday } => {
                Ok(nth_weekday_in_month(year, anchor_month, nth, weekday))
            }
        }
    }

    fn next_custom(&self, anchor: NaiveDate, config: &CustomConfig) -> RecurResult<NaiveDate> {
        let every = if config.every == 0 {
            tracing::warn!("Custom interval of zero evaluates as one");
            1
        } else {
            config.every
        };
        match &config.step {
            CustomStep::Days => Ok(anchor + Days::new(u64::from(every))),
            CustomStep::Weeks(refine) => {
                let pivot = anchor + Days::new(7 * u64::from(every));
                if let Some(weekly) = refine
                    && !weekly.weekdays.is_empty()
                {
                    Ok(next_in_weekday_set(pivot, weekly))
                } else {
                    Ok(pivot)
                }
            }
            CustomStep::Months(refine) => {
                let pivot = add_months_clamped(anchor, every);
                match refine {
                    Some(monthly) => self.resolve_in_month(pivot.year(), pivot.month(), *monthly),
                    None => Ok(pivot),
                }
            }
            CustomStep::Years(refine) => {
                let pivot = add_years_clamped(anchor, every);
                match refine {
                    Some(yearly) => self.resolve_in_year(pivot.year(), pivot.month(), *yearly),
                    None => Ok(pivot),
                }
            }
        }
    }

    /// Nth workday or rest day of a month, per the calendar oracle.
    ///
    /// Walks the oracle through the month once, collecting qualifying days,
    /// then indexes by ordinal. Falls back to the first of the month when
    /// the ordinal runs past the qualifying days.
    fn nth_oracle_day(
        &self,
        year: i32,
        month: u32,
        nth: Ordinal,
        kind: DayKind,
    ) -> RecurResult<NaiveDate> {
        let start = first_of_month(year, month);
        let end = month_end(year, month);
        let mut qualifying = Vec::new();
        let mut cursor = start.pred_opt().unwrap_or(start);
        loop {
            cursor = match kind {
                DayKind::RestDay => self.calendar.next_rest_day(cursor)?,
                _ => self.calendar.next_workday(cursor)?,
            };
            if cursor > end {
                break;
            }
            qualifying.push(cursor);
        }

        let resolved = match nth.forward_offset() {
            Some(offset) => usize::try_from(offset)
                .ok()
                .and_then(|i| qualifying.get(i))
                .copied(),
            None if matches!(nth, Ordinal::Last) => qualifying.last().copied(),
            None => qualifying
                .len()
                .checked_sub(2)
                .and_then(|i| qualifying.get(i))
                .copied(),
        };
        Ok(resolved.unwrap_or_else(|| {
            tracing::warn!(
                year,
                month,
                "No qualifying day for ordinal day rule, falling back to month start"
            );
            start
        }))
    }
}

/// If the date lands on a weekend, moves it to the following Monday.
fn skip_weekend_forward(date: NaiveDate) -> NaiveDate {
    match Weekday::from(date.weekday()) {
        Weekday::Saturday => date + Days::new(2),
        Weekday::Sunday => date + Days::new(1),
        _ => date,
    }
}

/// If the date is not a weekend day, moves it to the next Saturday.
fn advance_to_weekend(date: NaiveDate) -> NaiveDate {
    let weekday = Weekday::from(date.weekday());
    if weekday.is_weekend() {
        date
    } else {
        let to_saturday = i64::from(Weekday::Saturday.iso_number())
            .wrapping_sub(i64::from(weekday.iso_number()))
            .rem_euclid(7);
        date + Days::new(u64::try_from(to_saturday).unwrap_or(0))
    }
}

/// First date after `anchor` whose weekday is in the configured set.
///
/// An empty set falls back to a fixed seven-day advance.
fn next_in_weekday_set(anchor: NaiveDate, config: &WeeklyConfig) -> NaiveDate {
    if config.weekdays.is_empty() {
        tracing::warn!("Weekly rule has no weekdays configured, advancing a fixed week");
        return anchor + Days::new(7);
    }
    for offset in 1..=7 {
        let candidate = anchor + Days::new(offset);
        if config.contains(Weekday::from(candidate.weekday())) {
            return candidate;
        }
    }
    // A non-empty set always matches within seven days.
    anchor + Days::new(7)
}

/// The year and month immediately after the given date's month.
fn month_after(date: NaiveDate) -> (i32, u32) {
    if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    }
}

/// Returns the number of days in a month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month_start
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    ymd_clamped(year, month, 31)
}

/// Builds a date with the day clamped into the month's length.
fn ymd_clamped(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Adds whole months, clamping the day to the target month's length
/// (Jan 31 + 1 month = Feb 28/29).
fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let total = i64::from(date.month0()) + i64::from(months);
    let year = date.year() + i32::try_from(total / 12).unwrap_or(0);
    let month = u32::try_from(total % 12).unwrap_or(0) + 1;
    ymd_clamped(year, month, date.day())
}

/// Adds whole years, clamping Feb 29 to Feb 28 off leap years.
fn add_years_clamped(date: NaiveDate, years: u32) -> NaiveDate {
    let year = date.year().saturating_add(i32::try_from(years).unwrap_or(0));
    ymd_clamped(year, date.month(), date.day())
}

/// The nth occurrence of a weekday within a month.
///
/// Forward ordinals locate the first occurrence and step in whole weeks;
/// the backward ordinals scan from month end, so "last Friday" stays
/// correct in months with four or five Fridays alike.
fn nth_weekday_in_month(year: i32, month: u32, nth: Ordinal, weekday: Weekday) -> NaiveDate {
    let target = i64::from(weekday.iso_number());
    if let Some(offset) = nth.forward_offset() {
        let first = first_of_month(year, month);
        let first_weekday = i64::from(Weekday::from(first.weekday()).iso_number());
        let to_first_match = target.wrapping_sub(first_weekday).rem_euclid(7);
        let days_forward = u64::try_from(to_first_match).unwrap_or(0) + 7 * u64::from(offset);
        first + Days::new(days_forward)
    } else {
        let end = month_end(year, month);
        let end_weekday = i64::from(Weekday::from(end.weekday()).iso_number());
        let back_to_match = end_weekday.wrapping_sub(target).rem_euclid(7);
        let last = end - Days::new(u64::try_from(back_to_match).unwrap_or(0));
        if matches!(nth, Ordinal::Last) {
            last
        } else {
            last - Days::new(7)
        }
    }
}

/// The nth plain calendar day of a month.
fn nth_calendar_day(year: i32, month: u32, nth: Ordinal) -> NaiveDate {
    let start = first_of_month(year, month);
    let end = month_end(year, month);
    match nth.forward_offset() {
        Some(offset) => start + Days::new(u64::from(offset)),
        None if matches!(nth, Ordinal::Last) => end,
        None => end.pred_opt().unwrap_or(end),
    }
}
