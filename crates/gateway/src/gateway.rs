use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::error::GatewayResult;
use super::wire::{ChatReply, ChatRequest, ProcessedVideo, UploadReceipt};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receives byte counts while an upload body is being sent.
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// The four remote operations the conversation core depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Process,
    Summary,
    Chat,
}

impl Operation {
    pub fn path(self) -> &'static str {
        match self {
            Self::Upload => "/api/upload",
            Self::Process => "/api/process",
            Self::Summary => "/api/summary",
            Self::Chat => "/api/chat",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upload => "upload",
            Self::Process => "process",
            Self::Summary => "summary",
            Self::Chat => "chat",
        };
        formatter.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub sent_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn endpoint(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.path())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Content type implied by a video file extension, `application/octet-stream` otherwise.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, extension)| extension.to_ascii_lowercase());
    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("avi") => "video/avi",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// File contents handed to the upload operation.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadPayload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadPayload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Typed access to the video backend. Implementations translate every transport,
/// status and payload problem into a [`GatewayError`](super::GatewayError).
pub trait BackendGateway: Send + Sync {
    fn upload<'a>(
        &'a self,
        payload: UploadPayload,
        on_progress: ProgressCallback,
    ) -> BoxFuture<'a, GatewayResult<UploadReceipt>>;

    fn process<'a>(&'a self, server_filename: &'a str) -> BoxFuture<'a, GatewayResult<ProcessedVideo>>;

    fn summarize<'a>(&'a self, server_filename: &'a str) -> BoxFuture<'a, GatewayResult<String>>;

    fn chat<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, GatewayResult<ChatReply>>;
}
