use super::templates::{heading, system_instruction};
use crate::context::StageInput;
use crate::core::{ChatMessage, Skill};
use crate::errors::ComposerFault;

/// Builds the message list for one invocation of `skill`.
///
/// Returns a system message with the skill's fixed instruction followed by a
/// single user message. The user message renders the required slots and then
/// any optional slots that are present, each under its heading. Slot values
/// are copied verbatim; slots the skill does not use are ignored.
pub fn compose(skill: Skill, input: &StageInput) -> Result<Vec<ChatMessage>, ComposerFault> {
    let mut sections = Vec::with_capacity(skill.required_slots().len() + skill.optional_slots().len());

    for &slot in skill.required_slots() {
        let value = input.require(skill, slot)?;
        sections.push(format!("{}{value}", heading(skill, slot)));
    }
    for &slot in skill.optional_slots() {
        if let Some(value) = input.get(slot) {
            sections.push(format!("{}{value}", heading(skill, slot)));
        }
    }

    Ok(vec![
        ChatMessage::system(system_instruction(skill)),
        ChatMessage::user(sections.join("\n")),
    ])
}
