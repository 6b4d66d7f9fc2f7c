//! Skills and the input slots they consume.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named role the model is asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Turn a request into a step-by-step implementation plan.
    Plan,
    /// Write code that follows a plan.
    Implement,
    /// Produce a plan for finding defects in code.
    DebugPlan,
    /// Apply a debug plan and return corrected code.
    Debug,
    /// Judge whether final code satisfies the request.
    Validate,
    /// Write deployment instructions for code.
    Deploy,
}

impl Skill {
    /// Every skill, in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Plan,
        Self::Implement,
        Self::DebugPlan,
        Self::Debug,
        Self::Validate,
        Self::Deploy,
    ];

    /// Returns the wire name of the skill.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Implement => "implement",
            Self::DebugPlan => "debug_plan",
            Self::Debug => "debug",
            Self::Validate => "validate",
            Self::Deploy => "deploy",
        }
    }

    /// Slots that must be present for the prompt to be composed.
    #[must_use]
    pub const fn required_slots(self) -> &'static [Slot] {
        match self {
            Self::Plan => &[Slot::OriginalPrompt],
            Self::Implement => &[Slot::OriginalPrompt, Slot::Plan],
            Self::DebugPlan | Self::Validate | Self::Deploy => &[Slot::OriginalPrompt, Slot::Code],
            Self::Debug => &[Slot::OriginalPrompt, Slot::Code, Slot::DebugPlan],
        }
    }

    /// Slots that are rendered when present and ignored otherwise.
    #[must_use]
    pub const fn optional_slots(self) -> &'static [Slot] {
        match self {
            Self::Implement => &[Slot::PriorCode, Slot::CompanionCode],
            _ => &[],
        }
    }

    /// Describes the activity, used to build failure reasons.
    #[must_use]
    pub const fn activity(self) -> &'static str {
        match self {
            Self::Plan => "generating plan",
            Self::Implement => "generating code",
            Self::DebugPlan => "generating debug plan",
            Self::Debug => "debugging code",
            Self::Validate => "validating output",
            Self::Deploy => "writing deployment instructions",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown skill name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skill: {0}")]
pub struct UnknownSkill(pub String);

impl FromStr for Skill {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "plan" => Ok(Self::Plan),
            "implement" | "code" => Ok(Self::Implement),
            "debug_plan" => Ok(Self::DebugPlan),
            "debug" => Ok(Self::Debug),
            "validate" => Ok(Self::Validate),
            "deploy" => Ok(Self::Deploy),
            _ => Err(UnknownSkill(s.to_string())),
        }
    }
}

/// A named input a skill's prompt can draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    /// The user's request.
    OriginalPrompt,
    /// A plan produced by the Plan skill or a fixed instruction.
    Plan,
    /// Code under review.
    Code,
    /// A plan produced by the DebugPlan skill.
    DebugPlan,
    /// Existing code an implementation should build on.
    PriorCode,
    /// Code from a sibling track that must be reconciled.
    CompanionCode,
}

impl Slot {
    /// Returns the wire name of the slot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OriginalPrompt => "originalPrompt",
            Self::Plan => "plan",
            Self::Code => "code",
            Self::DebugPlan => "debugPlan",
            Self::PriorCode => "priorCode",
            Self::CompanionCode => "companionCode",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown slot name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown slot: {0}")]
pub struct UnknownSlot(pub String);

impl FromStr for Slot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        match key.to_ascii_lowercase().as_str() {
            "originalprompt" | "prompt" => Ok(Self::OriginalPrompt),
            "plan" => Ok(Self::Plan),
            "code" => Ok(Self::Code),
            "debugplan" => Ok(Self::DebugPlan),
            "priorcode" => Ok(Self::PriorCode),
            "companioncode" => Ok(Self::CompanionCode),
            _ => Err(UnknownSlot(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_round_trips_through_str() {
        for skill in Skill::ALL {
            assert_eq!(skill.as_str().parse::<Skill>().unwrap(), skill);
        }
        assert_eq!("debug-plan".parse::<Skill>().unwrap(), Skill::DebugPlan);
        assert!("refactor".parse::<Skill>().is_err());
    }

    #[test]
    fn test_slot_parsing_accepts_common_spellings() {
        assert_eq!("originalPrompt".parse::<Slot>().unwrap(), Slot::OriginalPrompt);
        assert_eq!("original_prompt".parse::<Slot>().unwrap(), Slot::OriginalPrompt);
        assert_eq!("debug-plan".parse::<Slot>().unwrap(), Slot::DebugPlan);
        assert!("nonsense".parse::<Slot>().is_err());
    }

    #[test]
    fn test_required_and_optional_slots_are_disjoint() {
        for skill in Skill::ALL {
            for slot in skill.optional_slots() {
                assert!(!skill.required_slots().contains(slot), "{skill} lists {slot} twice");
            }
            assert!(skill.required_slots().contains(&Slot::OriginalPrompt));
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Skill::DebugPlan).unwrap(), "\"debug_plan\"");
        assert_eq!(serde_json::to_string(&Slot::OriginalPrompt).unwrap(), "\"originalPrompt\"");
    }
}
