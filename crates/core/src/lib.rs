#![deny(unsafe_code)]

//! Conversation core for chatting about an uploaded video.
//!
//! [`Orchestrator`] owns the transcript and the active [`VideoArtifact`], routes user
//! text to an [`Intent`], drives the upload-then-process pipeline and keeps placeholder
//! messages stable while backend calls are outstanding.

pub mod artifact;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod placeholder;
pub mod replies;
pub mod router;
pub mod settings;
pub mod store;
pub mod upload;

pub use artifact::{ArtifactVersion, VideoArtifact};
pub use error::{UploadError, UploadPhase, UploadResult};
pub use message::{Message, MessageId, Sender};
pub use orchestrator::Orchestrator;
pub use placeholder::PlaceholderToken;
pub use router::{Intent, classify};
pub use settings::ConversationSettings;
pub use store::ConversationState;
pub use upload::{UploadPipeline, UploadProgress, VideoFile, validate};
