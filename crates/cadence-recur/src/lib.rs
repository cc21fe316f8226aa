//! Recurrence rule engine for the Cadence productivity backend.
//!
//! This crate computes when a recurring schedule happens next and expands a
//! schedule into concrete occurrences over a query window. It is designed
//! for:
//! - Deterministic evaluation: `RuleEvaluator` is a pure function over its
//!   inputs and never performs I/O
//! - Bounded expansion: `OccurrenceExpander` honors the rule's termination
//!   policy, a query window, and a hard step cap
//! - External calendars: workday/rest-day modes consult an injected
//!   [`CalendarOracle`], never a hard-coded holiday table
//!
//! The engine never writes state. Expansion returns the advanced cursor and
//! occurrence count in an [`Expansion`] value for the caller to persist.

pub mod calendar;
pub mod error;
pub mod evaluate;
pub mod expand;
pub mod rule;

pub use calendar::{CalendarError, CalendarOracle, TableCalendar, WeekendCalendar};
pub use error::{RecurError, RecurResult};
pub use evaluate::RuleEvaluator;
pub use expand::{Expansion, ExpansionLimits, OccurrenceDescriptor, OccurrenceExpander};
pub use rule::{
    CustomConfig, CustomStep, DayKind, EndPolicy, MonthlyConfig, Ordinal, RecurrenceMode,
    RecurrenceRule, Weekday, WeeklyConfig, YearlyConfig,
};
