use super::message::{MessageId, Sender};
use super::store::ConversationState;

/// Opaque handle to a transient assistant message awaiting its final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderToken(MessageId);

impl PlaceholderToken {
    pub fn message_id(self) -> MessageId {
        self.0
    }
}

impl ConversationState {
    /// Appends an assistant message that will later be overwritten in place.
    pub fn insert_placeholder(&mut self, text: impl Into<String>) -> PlaceholderToken {
        PlaceholderToken(self.append(Sender::Assistant, text))
    }

    /// Swaps the placeholder's text for `final_text`.
    ///
    /// A placeholder that no longer exists (the conversation was reset while the request
    /// was in flight) is silently skipped; the return value reports whether anything changed.
    pub fn resolve(&mut self, token: PlaceholderToken, final_text: impl Into<String>) -> bool {
        let resolved = self.patch_text(token.0, final_text);
        if !resolved {
            tracing::debug!(
                message_id = %token.0,
                "placeholder vanished before it was resolved"
            );
        }
        resolved
    }
}
