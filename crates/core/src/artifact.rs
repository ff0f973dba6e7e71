use vidchat_gateway::{FrameDescriptor, ProcessedVideo, TranscriptSegment, UploadReceipt};

/// Identifies one committed artifact. Every upload that commits gets a new, larger version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactVersion(pub u64);

/// Everything known about the processed video the conversation is about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoArtifact {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub server_filename: Option<String>,
    pub transcript_text: Option<String>,
    pub transcript_segments: Vec<TranscriptSegment>,
    pub frames: Vec<FrameDescriptor>,
    pub summary: Option<String>,
}

impl VideoArtifact {
    /// Combines the original file metadata with both phase results.
    pub fn assemble(
        name: String,
        size_bytes: u64,
        mime_type: String,
        receipt: UploadReceipt,
        processed: ProcessedVideo,
    ) -> Self {
        Self {
            name,
            size_bytes,
            mime_type,
            server_filename: Some(receipt.server_filename),
            transcript_text: Some(processed.transcript_text),
            transcript_segments: processed.transcript_segments,
            frames: processed.frames,
            summary: processed.summary,
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript().is_some()
    }

    pub fn word_count(&self) -> usize {
        self.transcript()
            .map_or(0, |text| text.split_whitespace().count())
    }

    /// End of the last transcript segment, in seconds.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.transcript_segments
            .last()
            .map(|segment| segment.end)
            .filter(|end| end.is_finite() && *end > 0.0)
    }

    /// Context sent along with free-form chat: summary, else transcript, else nothing.
    pub fn chat_context(&self) -> String {
        self.summary
            .clone()
            .or_else(|| self.transcript_text.clone())
            .unwrap_or_default()
    }
}
