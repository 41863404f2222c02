//! Accumulated dialogue context for multi-turn conversations.

use thiserror::Error;

use crate::llm::{Message, Role};

/// Errors raised while extending a conversation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// A message arrived with a role outside system/user/assistant.
    #[error("invalid message role: {0}")]
    InvalidRole(String),
}

/// Ordered, append-only message history.
///
/// Messages are never reordered or removed. The first entry, when present, is
/// normally the system message that sets the assistant's persona.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    history: Vec<Message>,
}

impl ConversationState {
    /// Create a conversation, optionally seeded with a system message.
    pub fn new(seed: Option<Message>) -> Self {
        Self {
            history: seed.into_iter().collect(),
        }
    }

    /// Start a conversation whose first message is the given system prompt.
    pub fn with_system(instructions: impl Into<String>) -> Self {
        Self::new(Some(Message::system(instructions)))
    }

    pub fn append(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Append a message whose role arrived as text, e.g. from a JSON payload.
    pub fn append_untyped(
        &mut self,
        role: &str,
        content: impl Into<String>,
    ) -> Result<(), ConversationError> {
        let role: Role = role.parse()?;
        self.append(Message::new(role, content));
        Ok(())
    }

    /// Copy of the current history. Changing it does not affect the state.
    pub fn snapshot(&self) -> Vec<Message> {
        self.history.clone()
    }

    /// Borrowed view of the history, for sending without copying.
    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_without_seed_is_empty() {
        let state = ConversationState::new(None);
        assert!(state.is_empty());
        assert!(state.last().is_none());
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn seed_becomes_first_message() {
        let state = ConversationState::with_system("Remember the context.");
        assert_eq!(state.len(), 1);
        assert_eq!(state.messages()[0], Message::system("Remember the context."));
    }

    #[test]
    fn append_preserves_prior_order() {
        let mut state = ConversationState::with_system("persona");
        state.append(Message::user("first"));
        state.append(Message::assistant("reply"));
        let before = state.snapshot();

        state.append(Message::user("second"));
        let after = state.snapshot();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], before.as_slice());
        assert_eq!(after.last(), Some(&Message::user("second")));
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let mut state = ConversationState::with_system("persona");
        let mut copy = state.snapshot();
        copy.push(Message::user("injected"));
        copy.clear();

        assert_eq!(state.len(), 1);
        state.append(Message::user("real"));
        assert!(copy.is_empty());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn append_untyped_accepts_known_roles() {
        let mut state = ConversationState::new(None);
        state.append_untyped("user", "hello").unwrap();
        state.append_untyped("assistant", "hi").unwrap();

        assert_eq!(
            state.snapshot(),
            vec![Message::user("hello"), Message::assistant("hi")]
        );
    }

    #[test]
    fn append_untyped_rejects_unknown_role() {
        let mut state = ConversationState::with_system("persona");
        let err = state.append_untyped("moderator", "hush").unwrap_err();

        assert_eq!(err, ConversationError::InvalidRole("moderator".to_string()));
        assert_eq!(state.len(), 1);
    }
}
