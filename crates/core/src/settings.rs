use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 500;
pub const DEFAULT_TRANSCRIPT_CHAR_BUDGET: usize = 2_000;

/// Behaviour knobs for the conversation orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSettings {
    /// User input beyond this many characters is cut off before it is appended.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    /// Longest transcript excerpt shown in one message.
    #[serde(default = "default_transcript_char_budget")]
    pub transcript_char_budget: usize,
    /// When set, a failed summary/chat request overwrites its placeholder with the apology
    /// instead of appending the apology as a new message.
    #[serde(default)]
    pub resolve_placeholder_on_failure: bool,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            transcript_char_budget: DEFAULT_TRANSCRIPT_CHAR_BUDGET,
            resolve_placeholder_on_failure: false,
        }
    }
}

impl ConversationSettings {
    /// Replaces zero limits with the defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_message_chars == 0 {
            self.max_message_chars = DEFAULT_MAX_MESSAGE_CHARS;
        }
        if self.transcript_char_budget == 0 {
            self.transcript_char_budget = DEFAULT_TRANSCRIPT_CHAR_BUDGET;
        }
        self
    }
}

fn default_max_message_chars() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}

fn default_transcript_char_budget() -> usize {
    DEFAULT_TRANSCRIPT_CHAR_BUDGET
}
