//! Calendar oracle capability.
//!
//! Workday and rest-day modes depend on a regional calendar the engine does
//! not own: public holidays, and the makeup workdays some regions schedule
//! on weekends around them. The oracle is injected so the engine stays pure
//! and tests run against a deterministic table.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

use crate::rule::Weekday;

/// Calendar lookup errors
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("No calendar data covers {0}")]
    Uncovered(NaiveDate),

    #[error("Calendar lookup failed: {0}")]
    Lookup(String),
}

/// External capability answering holiday-aware "next date" questions.
///
/// Both methods are exclusive of `after`: the answer is strictly later.
pub trait CalendarOracle {
    /// Returns the first workday strictly after the given date.
    ///
    /// ## Errors
    /// Returns an error if the calendar has no data for the dates it would
    /// need to inspect.
    fn next_workday(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError>;

    /// Returns the first rest day strictly after the given date.
    ///
    /// ## Errors
    /// Returns an error if the calendar has no data for the dates it would
    /// need to inspect.
    fn next_rest_day(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError>;
}

/// Oracle with no holiday data: rest days are exactly Saturday and Sunday.
///
/// Total over all dates, so it never errors. Useful as a fallback calendar
/// and for regions whose holiday table is not loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendCalendar;

impl WeekendCalendar {
    fn is_rest(date: NaiveDate) -> bool {
        // Holiday tables index weeks Sunday-first; keep the same convention
        // at this boundary.
        let index = Weekday::from(date.weekday()).sunday_index();
        index == 0 || index == 6
    }
}

impl CalendarOracle for WeekendCalendar {
    fn next_workday(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut date = after;
        loop {
            date = date + Days::new(1);
            if !Self::is_rest(date) {
                return Ok(date);
            }
        }
    }

    fn next_rest_day(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError> {
        let mut date = after;
        loop {
            date = date + Days::new(1);
            if Self::is_rest(date) {
                return Ok(date);
            }
        }
    }
}

/// Oracle backed by an explicit holiday table over a covered span.
///
/// Rest days are weekends plus listed holidays, minus listed makeup
/// workdays (weekend days a region declares working around a holiday
/// block). Lookups outside the covered span fail rather than guess.
#[derive(Debug, Clone)]
pub struct TableCalendar {
    covered_from: NaiveDate,
    covered_to: NaiveDate,
    holidays: BTreeSet<NaiveDate>,
    makeup_workdays: BTreeSet<NaiveDate>,
}

impl TableCalendar {
    /// Creates a table covering the given inclusive span with no holidays.
    #[must_use]
    pub const fn new(covered_from: NaiveDate, covered_to: NaiveDate) -> Self {
        Self {
            covered_from,
            covered_to,
            holidays: BTreeSet::new(),
            makeup_workdays: BTreeSet::new(),
        }
    }

    /// Adds a public holiday.
    #[must_use]
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Adds a makeup workday (a weekend day declared working).
    #[must_use]
    pub fn with_makeup_workday(mut self, date: NaiveDate) -> Self {
        self.makeup_workdays.insert(date);
        self
    }

    fn is_rest(&self, date: NaiveDate) -> Result<bool, CalendarError> {
        if date < self.covered_from || date > self.covered_to {
            return Err(CalendarError::Uncovered(date));
        }
        if self.holidays.contains(&date) {
            return Ok(true);
        }
        if self.makeup_workdays.contains(&date) {
            return Ok(false);
        }
        Ok(Weekday::from(date.weekday()).is_weekend())
    }

    fn scan(&self, after: NaiveDate, want_rest: bool) -> Result<NaiveDate, CalendarError> {
        let mut date = after;
        loop {
            date = date + Days::new(1);
            if self.is_rest(date)? == want_rest {
                return Ok(date);
            }
        }
    }
}

impl CalendarOracle for TableCalendar {
    fn next_workday(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(after, false)
    }

    fn next_rest_day(&self, after: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.scan(after, true)
    }
}
