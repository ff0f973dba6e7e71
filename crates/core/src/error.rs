use std::fmt;

use snafu::Snafu;
use vidchat_gateway::GatewayError;

/// One of the two sequential network steps of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPhase {
    Upload,
    Process,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => formatter.write_str("upload"),
            Self::Process => formatter.write_str("processing"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UploadError {
    #[snafu(display(
        "\"{name}\" is not a supported video file (got type '{mime_type}'); use MP4, AVI, MOV, or MKV"
    ))]
    Validation {
        stage: &'static str,
        name: String,
        mime_type: String,
    },
    #[snafu(display("video {phase} failed: {source}"))]
    Phase {
        stage: &'static str,
        phase: UploadPhase,
        source: GatewayError,
    },
}

impl UploadError {
    /// Failing network phase; `None` for files rejected before any request.
    pub fn phase(&self) -> Option<UploadPhase> {
        match self {
            Self::Validation { .. } => None,
            Self::Phase { phase, .. } => Some(*phase),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type UploadResult<T> = Result<T, UploadError>;
