use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use vidchat_gateway::{BackendGateway, ChatRequest};

use super::artifact::{ArtifactVersion, VideoArtifact};
use super::error::UploadResult;
use super::message::{Message, Sender};
use super::placeholder::PlaceholderToken;
use super::replies::{
    self, CHAT_APOLOGY, CHAT_FALLBACK, CHAT_PLACEHOLDER, NO_TRANSCRIPT_REPLY,
    NO_VIDEO_SUMMARY_REPLY, SUMMARY_APOLOGY, SUMMARY_PLACEHOLDER,
};
use super::router::{Intent, classify};
use super::settings::ConversationSettings;
use super::store::ConversationState;
use super::upload::{UploadPipeline, UploadProgress, VideoFile};

/// Network work left over after the synchronous part of a user message was applied.
enum Pending {
    Summary {
        token: PlaceholderToken,
        version: ArtifactVersion,
        server_filename: String,
    },
    Chat {
        token: PlaceholderToken,
        request: ChatRequest,
    },
}

/// Owns the conversation and turns user actions into transcript updates.
///
/// All state changes go through one mutex that is never held across a backend call, so
/// several requests may be outstanding at once and each placeholder is resolved on its
/// own, in whatever order the answers arrive.
pub struct Orchestrator {
    gateway: Arc<dyn BackendGateway>,
    pipeline: UploadPipeline,
    settings: ConversationSettings,
    state: Mutex<ConversationState>,
    revision: watch::Sender<u64>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn BackendGateway>, settings: ConversationSettings) -> Self {
        let state = ConversationState::seeded();
        let (revision, _) = watch::channel(state.revision());
        Self {
            pipeline: UploadPipeline::new(gateway.clone()),
            gateway,
            settings: settings.normalized(),
            state: Mutex::new(state),
            revision,
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub async fn snapshot(&self) -> ConversationState {
        self.state.lock().await.clone()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages().to_vec()
    }

    pub async fn artifact(&self) -> Option<VideoArtifact> {
        self.state.lock().await.artifact().cloned()
    }

    /// Fires with the store revision after every change to the conversation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn upload_progress(&self) -> watch::Receiver<Option<UploadProgress>> {
        self.pipeline.subscribe()
    }

    async fn mutate<R>(&self, apply: impl FnOnce(&mut ConversationState) -> R) -> R {
        let mut state = self.state.lock().await;
        let result = apply(&mut state);
        self.revision.send_replace(state.revision());
        result
    }

    /// Handles one line typed by the user.
    ///
    /// Blank input is ignored and yields `None`. Otherwise the user message is appended
    /// before anything else, and the classified intent is returned once the response path
    /// has finished.
    pub async fn send_user_message(&self, text: &str) -> Option<Intent> {
        let text = text
            .chars()
            .take(self.settings.max_message_chars)
            .collect::<String>();
        if text.trim().is_empty() {
            return None;
        }

        let (intent, pending) = self
            .mutate(|state| {
                state.append(Sender::User, text.as_str());
                let intent = classify(&text, state.artifact());
                tracing::debug!(intent = ?intent, "routed user message");
                let pending = self.dispatch(state, intent, &text);
                (intent, pending)
            })
            .await;

        match pending {
            Some(Pending::Summary {
                token,
                version,
                server_filename,
            }) => self.finish_summary(token, version, &server_filename).await,
            Some(Pending::Chat { token, request }) => self.finish_chat(token, request).await,
            None => {}
        }

        Some(intent)
    }

    /// Applies the synchronous part of `intent`; returns the request still to be made, if any.
    fn dispatch(&self, state: &mut ConversationState, intent: Intent, text: &str) -> Option<Pending> {
        match intent {
            Intent::ShowSummary => {
                let Some(artifact) = state.artifact() else {
                    state.append(Sender::Assistant, NO_VIDEO_SUMMARY_REPLY);
                    return None;
                };
                if let Some(summary) = artifact.summary.clone() {
                    state.append(Sender::Assistant, summary);
                    return None;
                }
                let Some(server_filename) = artifact.server_filename.clone() else {
                    tracing::warn!(name = %artifact.name, "artifact has no server filename to summarize");
                    state.append(Sender::Assistant, SUMMARY_APOLOGY);
                    return None;
                };
                let version = state.artifact_version()?;
                let token = state.insert_placeholder(SUMMARY_PLACEHOLDER);
                Some(Pending::Summary {
                    token,
                    version,
                    server_filename,
                })
            }
            Intent::ShowTranscript => {
                let reply = match state.artifact().and_then(VideoArtifact::transcript) {
                    Some(transcript) => {
                        replies::transcript_reply(transcript, self.settings.transcript_char_budget)
                    }
                    None => NO_TRANSCRIPT_REPLY.to_string(),
                };
                state.append(Sender::Assistant, reply);
                None
            }
            Intent::ShowFrames => {
                let reply = replies::frames_reply(state.artifact());
                state.append(Sender::Assistant, reply);
                None
            }
            Intent::GenericChat => {
                if let Some(reply) = replies::quick_reply(text, state.artifact()) {
                    state.append(Sender::Assistant, reply);
                    return None;
                }
                let context = state
                    .artifact()
                    .map(VideoArtifact::chat_context)
                    .unwrap_or_default();
                let token = state.insert_placeholder(CHAT_PLACEHOLDER);
                Some(Pending::Chat {
                    token,
                    request: ChatRequest::new(text, context),
                })
            }
        }
    }

    async fn finish_summary(
        &self,
        token: PlaceholderToken,
        version: ArtifactVersion,
        server_filename: &str,
    ) {
        match self.gateway.summarize(server_filename).await {
            Ok(summary) => {
                self.mutate(|state| {
                    state.resolve(token, summary.as_str());
                    if !state.fill_summary(version, summary) {
                        tracing::warn!(
                            server_filename = %server_filename,
                            "summary arrived for a replaced video; not caching it"
                        );
                    }
                })
                .await;
            }
            Err(error) => {
                tracing::warn!(
                    server_filename = %server_filename,
                    error = %error,
                    "summary generation failed"
                );
                self.mutate(|state| self.report_failure(state, token, SUMMARY_APOLOGY))
                    .await;
            }
        }
    }

    async fn finish_chat(&self, token: PlaceholderToken, request: ChatRequest) {
        match self.gateway.chat(request).await {
            Ok(answer) => {
                let reply = answer
                    .reply
                    .filter(|reply| !reply.trim().is_empty())
                    .unwrap_or_else(|| CHAT_FALLBACK.to_string());
                self.mutate(|state| state.resolve(token, reply)).await;
            }
            Err(error) => {
                tracing::warn!(error = %error, "chat request failed");
                self.mutate(|state| self.report_failure(state, token, CHAT_APOLOGY))
                    .await;
            }
        }
    }

    fn report_failure(&self, state: &mut ConversationState, token: PlaceholderToken, apology: &str) {
        if state.message(token.message_id()).is_none() {
            tracing::debug!(
                message_id = %token.message_id(),
                "dropping failure for a conversation that was reset"
            );
            return;
        }
        if self.settings.resolve_placeholder_on_failure {
            state.resolve(token, apology);
        } else {
            state.append(Sender::Assistant, apology);
        }
    }

    /// Uploads and processes `file`, then announces it and makes it the active artifact.
    ///
    /// Failures are returned to the caller for display and leave the transcript and the
    /// previous artifact untouched.
    pub async fn upload_file(&self, file: VideoFile) -> UploadResult<ArtifactVersion> {
        let artifact = self.pipeline.submit(file).await?;

        let version = self
            .mutate(|state| {
                state.append(Sender::User, replies::upload_notice(&artifact.name));
                state.append(Sender::Assistant, replies::upload_report(&artifact));
                state.replace_artifact(artifact)
            })
            .await;

        tracing::info!(version = version.0, "video artifact committed");
        Ok(version)
    }

    /// Starts over with only the greeting. Requests still in flight resolve as no-ops.
    pub async fn reset(&self) {
        self.mutate(ConversationState::reset).await;
        tracing::debug!("conversation reset");
    }
}
