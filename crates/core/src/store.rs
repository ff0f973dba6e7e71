use super::artifact::{ArtifactVersion, VideoArtifact};
use super::message::{Message, MessageId, Sender};
use super::replies::GREETING;

#[derive(Debug, Clone, PartialEq)]
struct ActiveArtifact {
    version: ArtifactVersion,
    artifact: VideoArtifact,
}

/// Single source of truth for the transcript and the active video artifact.
///
/// Messages are append-only; the only in-place edit is a text patch addressed by id.
/// Ids come from a counter owned here, so they stay unique and increasing even when
/// many messages are appended within the same clock tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
    artifact: Option<ActiveArtifact>,
    next_message_id: u64,
    next_artifact_version: u64,
    revision: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ConversationState {
    /// Creates a conversation that opens with the assistant greeting.
    pub fn seeded() -> Self {
        let mut state = Self::empty();
        state.append(Sender::Assistant, GREETING);
        state
    }

    /// Creates a conversation with no messages at all.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            artifact: None,
            next_message_id: 1,
            next_artifact_version: 1,
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn artifact(&self) -> Option<&VideoArtifact> {
        self.artifact.as_ref().map(|active| &active.artifact)
    }

    pub fn artifact_version(&self) -> Option<ArtifactVersion> {
        self.artifact.as_ref().map(|active| active.version)
    }

    /// Bumped on every mutation so observers can tell when to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id += 1;
        self.messages.push(Message::new(id, sender, text));
        self.revision += 1;
        id
    }

    /// Replaces the text of message `id`, keeping its sender, timestamp and position.
    ///
    /// Returns `false` when no such message exists.
    pub fn patch_text(&mut self, id: MessageId, text: impl Into<String>) -> bool {
        let Some(message) = self.messages.iter_mut().find(|message| message.id == id) else {
            return false;
        };
        message.text = text.into();
        self.revision += 1;
        true
    }

    /// Installs a new artifact, dropping the previous one wholesale.
    pub fn replace_artifact(&mut self, artifact: VideoArtifact) -> ArtifactVersion {
        let version = ArtifactVersion(self.next_artifact_version);
        self.next_artifact_version += 1;
        self.artifact = Some(ActiveArtifact { version, artifact });
        self.revision += 1;
        version
    }

    /// Caches a lazily generated summary on the artifact it was requested for.
    ///
    /// Returns `false` and leaves state untouched when that artifact is no longer active.
    pub fn fill_summary(&mut self, version: ArtifactVersion, summary: impl Into<String>) -> bool {
        match self.artifact.as_mut() {
            Some(active) if active.version == version => {
                active.artifact.summary = Some(summary.into());
                self.revision += 1;
                true
            }
            _ => false,
        }
    }

    /// Back to a fresh session: greeting only, no artifact.
    ///
    /// Id and version counters keep running so stale handles never match new entries.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.artifact = None;
        self.append(Sender::Assistant, GREETING);
    }
}
