//! Shared domain types without database dependencies.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Display fields copied from a schedule template onto every occurrence it
/// generates.
///
/// The snapshot is taken when the rule is created; later edits to the
/// template do not rewrite occurrences that were already materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    /// Task name shown to the user.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// Importance rating (0-3, Eisenhower axis).
    pub importance: u8,
    /// Urgency rating (0-3, Eisenhower axis).
    pub urgency: u8,
}

impl TemplateSnapshot {
    /// Creates a snapshot with the given name and default ratings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            importance: 0,
            urgency: 0,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the importance and urgency ratings.
    #[must_use]
    pub const fn with_ratings(mut self, importance: u8, urgency: u8) -> Self {
        self.importance = importance;
        self.urgency = urgency;
        self
    }

    /// Validates the snapshot fields.
    ///
    /// ## Errors
    /// Returns an error if the name is empty or a rating is out of range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "template name must not be empty".to_string(),
            ));
        }
        if self.importance > 3 || self.urgency > 3 {
            return Err(CoreError::ValidationError(format!(
                "importance/urgency must be 0-3, got {}/{}",
                self.importance, self.urgency
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_builder() {
        let snapshot = TemplateSnapshot::new("Water the plants")
            .with_description("Balcony and kitchen")
            .with_tags(vec!["home".to_string()])
            .with_ratings(1, 2);

        assert_eq!(snapshot.name, "Water the plants");
        assert_eq!(snapshot.description.as_deref(), Some("Balcony and kitchen"));
        assert_eq!(snapshot.tags, vec!["home".to_string()]);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let snapshot = TemplateSnapshot::new("   ");
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn rating_out_of_range_rejected() {
        let snapshot = TemplateSnapshot::new("Stretch").with_ratings(4, 0);
        assert!(snapshot.validate().is_err());
    }
}
