//! End-to-end expansion scenarios: persisted state across calls, window
//! discipline, and termination policies working together.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use cadence_core::types::TemplateSnapshot;
use cadence_recur::{
    EndPolicy, ExpansionLimits, MonthlyConfig, OccurrenceExpander, Ordinal, RecurError,
    RecurrenceMode, RecurrenceRule, TableCalendar, Weekday, WeekendCalendar, WeeklyConfig,
    YearlyConfig,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rule(mode: RecurrenceMode, start: NaiveDate) -> RecurrenceRule {
    RecurrenceRule::new(TemplateSnapshot::new("Recurring task"), mode, start)
}

fn never_exists(_: Uuid, _: NaiveDate) -> bool {
    false
}

#[test_log::test]
fn for_times_is_cumulative_across_calls() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(RecurrenceMode::Daily, date(2023, 6, 1))
        .with_end_policy(EndPolicy::ForTimes(5));

    let first = expander
        .expand(&template, date(2023, 6, 1), date(2023, 6, 3), never_exists)
        .unwrap();
    assert_eq!(first.occurrences.len(), 3);
    assert_eq!(first.occurrences_emitted, 3);

    // Write back the cursor state, then ask for the rest of the month.
    let resumed = template
        .clone()
        .with_state(first.cursor_date, first.occurrences_emitted);
    let second = expander
        .expand(&resumed, date(2023, 6, 4), date(2023, 6, 30), never_exists)
        .unwrap();
    assert_eq!(second.occurrences.len(), 2);
    assert_eq!(second.occurrences_emitted, 5);

    // The lifetime budget is spent; further windows yield nothing.
    let drained = template
        .clone()
        .with_state(second.cursor_date, second.occurrences_emitted);
    let third = expander
        .expand(&drained, date(2023, 7, 1), date(2023, 7, 31), never_exists)
        .unwrap();
    assert!(third.occurrences.is_empty());
    assert_eq!(third.occurrences_emitted, 5);
}

#[test_log::test]
fn expansion_is_idempotent_for_unchanged_state() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(
        RecurrenceMode::Weekly(WeeklyConfig::on(vec![Weekday::Monday, Weekday::Wednesday])),
        date(2023, 6, 1),
    );

    let a = expander
        .expand(&template, date(2023, 6, 1), date(2023, 7, 31), never_exists)
        .unwrap();
    let b = expander
        .expand(&template, date(2023, 6, 1), date(2023, 7, 31), never_exists)
        .unwrap();

    assert_eq!(a.occurrences, b.occurrences);
    assert_eq!(a.cursor_date, b.cursor_date);
    assert_eq!(a.occurrences_emitted, b.occurrences_emitted);
}

#[test_log::test]
fn emitted_dates_are_unique_and_inside_the_window() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(
        RecurrenceMode::Weekly(WeeklyConfig::on(vec![Weekday::Monday, Weekday::Wednesday])),
        date(2023, 5, 1),
    );
    let window_start = date(2023, 6, 1);
    let window_end = date(2023, 7, 31);

    let expansion = expander
        .expand(&template, window_start, window_end, never_exists)
        .unwrap();

    let mut seen = std::collections::BTreeSet::new();
    for occurrence in &expansion.occurrences {
        assert!(seen.insert(occurrence.date), "duplicate {}", occurrence.date);
        assert!(occurrence.date >= window_start && occurrence.date <= window_end);
        let weekday = Weekday::from(occurrence.date.weekday());
        assert!(matches!(weekday, Weekday::Monday | Weekday::Wednesday));
    }
    assert!(!expansion.occurrences.is_empty());
}

#[test_log::test]
fn to_date_never_emits_past_the_end_date() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let end = date(2023, 6, 20);
    let template = rule(RecurrenceMode::Daily, date(2023, 6, 1))
        .with_end_policy(EndPolicy::ToDate(end));

    let expansion = expander
        .expand(&template, date(2023, 6, 1), date(2023, 12, 31), never_exists)
        .unwrap();

    assert!(expansion.occurrences.iter().all(|o| o.date <= end));
    assert_eq!(expansion.occurrences.last().unwrap().date, end);
}

#[test_log::test]
fn rule_started_before_the_window_catches_up_silently() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(RecurrenceMode::Daily, date(2023, 6, 1));

    let expansion = expander
        .expand(&template, date(2023, 6, 10), date(2023, 6, 12), never_exists)
        .unwrap();

    let dates: Vec<_> = expansion.occurrences.iter().map(|o| o.date).collect();
    assert_eq!(dates, vec![date(2023, 6, 10), date(2023, 6, 11), date(2023, 6, 12)]);
    assert_eq!(expansion.cursor_date, date(2023, 6, 12));
}

#[test_log::test]
fn yearly_nth_weekday_holds_its_month_across_years() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    // Third Thursday of June, seeded from one.
    let template = rule(
        RecurrenceMode::Yearly(YearlyConfig::NthWeekday {
            nth: Ordinal::Third,
            weekday: Weekday::Thursday,
        }),
        date(2023, 6, 15),
    );

    let expansion = expander
        .expand(&template, date(2024, 1, 1), date(2026, 12, 31), never_exists)
        .unwrap();

    let dates: Vec<_> = expansion.occurrences.iter().map(|o| o.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 6, 20), date(2025, 6, 19), date(2026, 6, 18)]
    );
    for d in dates {
        assert_eq!(d.month(), 6);
        assert_eq!(Weekday::from(d.weekday()), Weekday::Thursday);
    }
}

#[test_log::test]
fn monthly_day_31_clamps_every_short_month() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(
        RecurrenceMode::Monthly(MonthlyConfig::DayOfMonth { day: 31 }),
        date(2023, 1, 15),
    );

    let expansion = expander
        .expand(&template, date(2023, 1, 1), date(2023, 6, 30), never_exists)
        .unwrap();

    let dates: Vec<_> = expansion.occurrences.iter().map(|o| o.date).collect();
    assert_eq!(
        dates,
        vec![
            date(2023, 2, 28),
            date(2023, 3, 31),
            date(2023, 4, 30),
            date(2023, 5, 31),
            date(2023, 6, 30),
        ]
    );
}

#[test_log::test]
fn workday_rule_fails_cleanly_past_calendar_coverage() {
    let calendar = TableCalendar::new(date(2023, 6, 1), date(2023, 6, 30));
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(RecurrenceMode::Workdays, date(2023, 6, 26));

    let result = expander.expand(&template, date(2023, 6, 26), date(2023, 7, 10), never_exists);
    assert!(matches!(result, Err(RecurError::Calendar(_))));
}

#[test_log::test]
fn step_cap_still_applies_to_pre_window_catch_up() {
    let calendar = WeekendCalendar;
    let expander =
        OccurrenceExpander::new(&calendar).with_limits(ExpansionLimits::default().with_max_steps(30));
    // A rule far in the past has too much catching up to do for the cap.
    let template = rule(RecurrenceMode::Daily, date(2020, 1, 1));

    let result = expander.expand(&template, date(2023, 6, 1), date(2023, 6, 2), never_exists);
    assert!(matches!(result, Err(RecurError::StepLimitExceeded(30))));
}

#[test_log::test]
fn exists_at_sees_each_candidate_once() {
    let calendar = WeekendCalendar;
    let expander = OccurrenceExpander::new(&calendar);
    let template = rule(RecurrenceMode::Daily, date(2023, 6, 1));

    let mut probes = Vec::new();
    let expansion = expander
        .expand(&template, date(2023, 6, 1), date(2023, 6, 7), |id, d| {
            probes.push((id, d));
            false
        })
        .unwrap();

    assert_eq!(probes.len(), expansion.occurrences.len());
    let mut deduped = probes.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), probes.len());
}
