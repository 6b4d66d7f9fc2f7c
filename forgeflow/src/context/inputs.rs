//! Slot-keyed stage inputs.

use crate::core::{Skill, Slot};
use crate::errors::ComposerFault;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The named values a stage's prompt is composed from.
///
/// Built once by the orchestrator with the consuming [`StageInput::with`]
/// builder and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageInput {
    slots: BTreeMap<Slot, String>,
}

impl StageInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the input with `slot` set to `value`.
    #[must_use]
    pub fn with(mut self, slot: Slot, value: impl Into<String>) -> Self {
        self.slots.insert(slot, value.into());
        self
    }

    /// Gets a slot value.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Gets a slot value that `skill` cannot do without.
    pub fn require(&self, skill: Skill, slot: Slot) -> Result<&str, ComposerFault> {
        self.get(slot)
            .ok_or_else(|| ComposerFault::missing_slot(skill, slot))
    }

    /// Returns true if the slot is present.
    #[must_use]
    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Returns the present slots in their canonical order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().copied()
    }

    /// Returns the number of slots present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<(Slot, String)> for StageInput {
    fn from_iter<I: IntoIterator<Item = (Slot, String)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let input = StageInput::new()
            .with(Slot::OriginalPrompt, "build a counter")
            .with(Slot::Plan, "1. render a button");

        assert_eq!(input.len(), 2);
        assert_eq!(input.get(Slot::Plan), Some("1. render a button"));
        assert!(input.get(Slot::Code).is_none());
        assert!(input.contains(Slot::OriginalPrompt));
    }

    #[test]
    fn test_require_reports_skill_and_slot() {
        let input = StageInput::new().with(Slot::OriginalPrompt, "x");
        let fault = input.require(Skill::Debug, Slot::DebugPlan).unwrap_err();
        assert_eq!(fault, ComposerFault::missing_slot(Skill::Debug, Slot::DebugPlan));
    }

    #[test]
    fn test_empty_value_counts_as_present() {
        let input = StageInput::new().with(Slot::Code, "");
        assert_eq!(input.require(Skill::Validate, Slot::Code).unwrap(), "");
    }

    #[test]
    fn test_deserializes_from_slot_map() {
        let input: StageInput =
            serde_json::from_str(r#"{"originalPrompt":"hi","code":"print(1)"}"#).unwrap();
        assert_eq!(input.get(Slot::Code), Some("print(1)"));
        assert_eq!(input.slots().collect::<Vec<_>>(), vec![Slot::OriginalPrompt, Slot::Code]);
    }
}
