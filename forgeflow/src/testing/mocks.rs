//! Chat model doubles for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{ChatMessage, Role, Skill};
use crate::errors::GatewayError;
use crate::gateway::ChatModel;
use crate::prompts::system_instruction;

/// A scripted model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Answer with this content.
    Text(String),
    /// Answer without content.
    NoContent,
    /// Fail with this error.
    Error(GatewayError),
}

impl Reply {
    fn into_outcome(self) -> Result<Option<String>, GatewayError> {
        match self {
            Self::Text(text) => Ok(Some(text)),
            Self::NoContent => Ok(None),
            Self::Error(e) => Err(e),
        }
    }
}

/// One call received by a [`ScriptedChatModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The skill recognised from the system message, if any.
    pub skill: Option<Skill>,
    /// The messages as received.
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<Skill, VecDeque<Reply>>,
    replies: HashMap<Skill, Reply>,
    fallback: Option<Reply>,
    calls: Vec<RecordedCall>,
}

/// A deterministic chat model that answers per skill.
///
/// The skill is recognised by matching the system message against each
/// skill's instruction. Queued replies are used first, then the skill's
/// standing reply, then the fallback, and finally `"<skill> output"`.
/// Clones share the script and call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChatModel {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl ScriptedChatModel {
    /// Creates a model with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the standing reply for a skill.
    #[must_use]
    pub fn with_reply(self, skill: Skill, text: impl Into<String>) -> Self {
        self.script.lock().replies.insert(skill, Reply::Text(text.into()));
        self
    }

    /// Makes every call for a skill fail.
    #[must_use]
    pub fn with_failure(self, skill: Skill, reason: impl Into<String>) -> Self {
        self.script
            .lock()
            .replies
            .insert(skill, Reply::Error(GatewayError::transport(reason, false)));
        self
    }

    /// Makes every call for a skill return no content.
    #[must_use]
    pub fn with_no_content(self, skill: Skill) -> Self {
        self.script.lock().replies.insert(skill, Reply::NoContent);
        self
    }

    /// Sets the reply for skills without a standing reply.
    #[must_use]
    pub fn with_fallback(self, text: impl Into<String>) -> Self {
        self.script.lock().fallback = Some(Reply::Text(text.into()));
        self
    }

    /// Makes skills without a standing reply return no content.
    #[must_use]
    pub fn with_fallback_no_content(self) -> Self {
        self.script.lock().fallback = Some(Reply::NoContent);
        self
    }

    /// Delays every reply.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a one-off reply for the next call of a skill.
    pub fn push_reply(&self, skill: Skill, reply: Reply) {
        self.script.lock().queued.entry(skill).or_default().push_back(reply);
    }

    /// Returns the total number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Returns the number of calls for a skill.
    #[must_use]
    pub fn calls_for(&self, skill: Skill) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|c| c.skill == Some(skill))
            .count()
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().calls.clone()
    }

    /// Returns the recognised skill of each call in order.
    #[must_use]
    pub fn skill_sequence(&self) -> Vec<Option<Skill>> {
        self.script.lock().calls.iter().map(|c| c.skill).collect()
    }

    /// Returns the messages of every call for a skill.
    #[must_use]
    pub fn messages_for(&self, skill: Skill) -> Vec<Vec<ChatMessage>> {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|c| c.skill == Some(skill))
            .map(|c| c.messages.clone())
            .collect()
    }

    fn next_reply(&self, skill: Option<Skill>, messages: &[ChatMessage]) -> Reply {
        let mut script = self.script.lock();
        script.calls.push(RecordedCall {
            skill,
            messages: messages.to_vec(),
        });

        if let Some(skill) = skill {
            if let Some(reply) = script.queued.get_mut(&skill).and_then(VecDeque::pop_front) {
                return reply;
            }
            if let Some(reply) = script.replies.get(&skill) {
                return reply.clone();
            }
        }
        script.fallback.clone().unwrap_or_else(|| {
            Reply::Text(skill.map_or_else(|| "output".to_string(), |s| format!("{s} output")))
        })
    }
}

fn recognise_skill(messages: &[ChatMessage]) -> Option<Skill> {
    let system = messages.iter().find(|m| m.role == Role::System)?;
    Skill::ALL
        .into_iter()
        .find(|skill| system.content == system_instruction(*skill))
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, GatewayError> {
        let reply = self.next_reply(recognise_skill(messages), messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_outcome()
    }
}

/// A model whose every call fails with the same error.
#[derive(Debug)]
pub struct FailingChatModel {
    error: GatewayError,
    calls: AtomicUsize,
}

impl FailingChatModel {
    /// Creates a model that fails with `error`.
    #[must_use]
    pub fn new(error: GatewayError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for FailingChatModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<Option<String>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StageInput;
    use crate::core::Slot;
    use crate::prompts::compose;

    fn plan_messages() -> Vec<ChatMessage> {
        compose(Skill::Plan, &StageInput::new().with(Slot::OriginalPrompt, "x")).unwrap()
    }

    #[tokio::test]
    async fn test_replies_by_skill() {
        let model = ScriptedChatModel::new().with_reply(Skill::Plan, "the plan");
        assert_eq!(model.complete(&plan_messages()).await.unwrap(), Some("the plan".to_string()));
        assert_eq!(model.calls_for(Skill::Plan), 1);
        assert_eq!(model.skill_sequence(), vec![Some(Skill::Plan)]);
    }

    #[tokio::test]
    async fn test_queued_replies_come_first() {
        let model = ScriptedChatModel::new().with_reply(Skill::Plan, "standing");
        model.push_reply(Skill::Plan, Reply::NoContent);

        assert_eq!(model.complete(&plan_messages()).await.unwrap(), None);
        assert_eq!(model.complete(&plan_messages()).await.unwrap(), Some("standing".to_string()));
    }

    #[tokio::test]
    async fn test_default_reply_names_the_skill() {
        let model = ScriptedChatModel::new();
        assert_eq!(model.complete(&plan_messages()).await.unwrap(), Some("plan output".to_string()));
        assert_eq!(
            model.complete(&[ChatMessage::user("hi")]).await.unwrap(),
            Some("output".to_string())
        );
    }

    #[tokio::test]
    async fn test_clones_share_the_call_log() {
        let model = ScriptedChatModel::new();
        let clone = model.clone();
        clone.complete(&plan_messages()).await.unwrap();
        assert_eq!(model.call_count(), 1);
        assert_eq!(model.messages_for(Skill::Plan)[0], plan_messages());
    }

    #[tokio::test]
    async fn test_failing_model_counts_calls() {
        let model = FailingChatModel::new(GatewayError::unavailable("no key"));
        assert!(model.complete(&plan_messages()).await.is_err());
        assert_eq!(model.call_count(), 1);
    }
}
