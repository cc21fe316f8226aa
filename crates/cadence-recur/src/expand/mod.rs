//! Occurrence expansion.
//!
//! [`OccurrenceExpander`] walks a rule's cursor forward through a query
//! window and materializes a descriptor for every date that is due and not
//! already realized. The loop is bounded three ways: by the rule's own
//! termination policy, by the window, and by a hard step cap that turns a
//! stuck rule into an error instead of an infinite loop.
//!
//! Expansion never mutates the rule it reads. The advanced cursor and
//! occurrence count come back in the [`Expansion`] value, and persisting
//! them is the caller's transaction to manage.

use chrono::NaiveDate;
use uuid::Uuid;

use cadence_core::constants::{DEFAULT_MAX_STEPS, GENERATED_FROM_REPEAT};

use crate::calendar::CalendarOracle;
use crate::error::{RecurError, RecurResult};
use crate::evaluate::RuleEvaluator;
use crate::rule::{EndPolicy, RecurrenceRule};

/// Hard bounds on a single expansion call.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionLimits {
    /// Maximum evaluator steps before the call aborts.
    pub max_steps: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl ExpansionLimits {
    /// Sets the step cap.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// One concrete occurrence produced by expansion.
///
/// Transient: it has no identity of its own until the caller chooses to
/// persist it as a task row. Display fields are copied from the rule's
/// template snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OccurrenceDescriptor {
    /// The template (rule) this occurrence was generated from.
    pub template_id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub importance: u8,
    pub urgency: u8,
    /// Marks the row as engine-generated rather than user-created.
    pub provenance: &'static str,
}

impl OccurrenceDescriptor {
    fn from_rule(rule: &RecurrenceRule, date: NaiveDate) -> Self {
        Self {
            template_id: rule.id,
            date,
            name: rule.template.name.clone(),
            description: rule.template.description.clone(),
            tags: rule.template.tags.clone(),
            importance: rule.template.importance,
            urgency: rule.template.urgency,
            provenance: GENERATED_FROM_REPEAT,
        }
    }
}

/// Result of one expansion call.
///
/// Carries the state the caller must write back: the advanced cursor and
/// the cumulative occurrence count.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Occurrences due in the window and not yet materialized, in order.
    pub occurrences: Vec<OccurrenceDescriptor>,
    /// Last date the rule was advanced to.
    pub cursor_date: NaiveDate,
    /// Occurrence slots consumed across the rule's lifetime.
    pub occurrences_emitted: u32,
}

/// Expands recurrence rules over a query window.
pub struct OccurrenceExpander<'a, C: CalendarOracle> {
    evaluator: RuleEvaluator<'a, C>,
    limits: ExpansionLimits,
}

impl<'a, C: CalendarOracle> OccurrenceExpander<'a, C> {
    /// Creates an expander backed by the given calendar, with default
    /// limits.
    #[must_use]
    pub fn new(calendar: &'a C) -> Self {
        Self {
            evaluator: RuleEvaluator::new(calendar),
            limits: ExpansionLimits::default(),
        }
    }

    /// Overrides the expansion limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: ExpansionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Expands the rule across `[window_start, window_end]` (both ends
    /// inclusive).
    ///
    /// `exists_at` answers whether a concrete instance is already
    /// materialized for `(rule.id, date)`; it is called at most once per
    /// candidate date. An already-materialized date still consumes an
    /// occurrence slot, it just emits no descriptor.
    ///
    /// ## Errors
    /// Returns an error when the calendar oracle fails, when the cursor
    /// fails to advance, when the rule's emitted count already exceeds its
    /// `ForTimes` limit, or when the step cap is exhausted before the loop
    /// terminates.
    #[tracing::instrument(
        skip(self, rule, exists_at),
        fields(rule_id = %rule.id, mode = %rule.mode)
    )]
    pub fn expand<F>(
        &self,
        rule: &RecurrenceRule,
        window_start: NaiveDate,
        window_end: NaiveDate,
        mut exists_at: F,
    ) -> RecurResult<Expansion>
    where
        F: FnMut(Uuid, NaiveDate) -> bool,
    {
        if let EndPolicy::ForTimes(limit) = rule.end_policy
            && rule.occurrences_emitted > limit
        {
            return Err(RecurError::CountOverrun {
                emitted: rule.occurrences_emitted,
                limit,
            });
        }

        let mut cursor = rule.cursor_date;
        let mut emitted = rule.occurrences_emitted;
        let mut occurrences = Vec::new();

        if window_end < window_start {
            tracing::debug!("Query window is empty");
            return Ok(Expansion {
                occurrences,
                cursor_date: cursor,
                occurrences_emitted: emitted,
            });
        }

        let mut steps = 0_usize;
        loop {
            if steps >= self.limits.max_steps {
                return Err(RecurError::StepLimitExceeded(self.limits.max_steps));
            }
            steps += 1;

            // Terminal rule: nothing further to produce.
            let Some(next) = self.evaluator.next_occurrence(cursor, rule)? else {
                break;
            };

            match rule.end_policy {
                EndPolicy::ForTimes(limit) if emitted >= limit => break,
                EndPolicy::ToDate(last) if next > last => break,
                _ => {}
            }

            if next <= cursor {
                return Err(RecurError::CursorStalled(cursor));
            }

            // A candidate past the window is not consumed; it belongs to a
            // later expansion pass.
            if next > window_end {
                break;
            }
            cursor = next;

            // The rule may have started before the query window.
            if next < window_start {
                continue;
            }

            if exists_at(rule.id, next) {
                tracing::trace!(date = %next, "Occurrence already materialized");
            } else {
                occurrences.push(OccurrenceDescriptor::from_rule(rule, next));
            }
            emitted += 1;
        }

        tracing::debug!(
            produced = occurrences.len(),
            occurrences_emitted = emitted,
            cursor = %cursor,
            "Expansion complete"
        );
        Ok(Expansion {
            occurrences,
            cursor_date: cursor,
            occurrences_emitted: emitted,
        })
    }
}
