use std::fmt;
use std::path::Path;
use std::sync::Arc;

use snafu::{ResultExt, ensure};
use tokio::sync::watch;
pub use vidchat_gateway::mime_type_for;
use vidchat_gateway::{BackendGateway, ProgressCallback, TransferProgress, UploadPayload};

use super::artifact::VideoArtifact;
use super::error::{PhaseSnafu, UploadPhase, UploadResult, ValidationSnafu};

pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "video/mp4",
    "video/avi",
    "video/quicktime",
    "video/x-matroska",
];
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Highest percentage reported while bytes are still being sent; the rest belongs to
/// processing so the bar never reads 100% before phase two starts.
pub const UPLOAD_PROGRESS_CAP: u8 = 90;

/// A candidate file as picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for VideoFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("VideoFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_type_for(&name);
        Ok(Self::new(name, mime_type, bytes))
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Accepts a file when either its reported MIME type or its extension is a known video
/// format. Browsers and file pickers often report MIME types unreliably, hence both.
pub fn validate(file: &VideoFile) -> UploadResult<()> {
    let mime_ok = ALLOWED_MIME_TYPES.contains(&file.mime_type.trim().to_ascii_lowercase().as_str());
    let extension_ok = extension(&file.name)
        .is_some_and(|extension| ALLOWED_EXTENSIONS.contains(&extension.as_str()));

    ensure!(
        mime_ok || extension_ok,
        ValidationSnafu {
            stage: "validate-video-file",
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        }
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub percent: u8,
    pub phase: UploadPhase,
}

impl UploadProgress {
    pub fn uploading(transfer: TransferProgress) -> Self {
        let percent = if transfer.total_bytes == 0 {
            UPLOAD_PROGRESS_CAP
        } else {
            let sent = transfer.sent_bytes.min(transfer.total_bytes);
            (sent * u64::from(UPLOAD_PROGRESS_CAP) / transfer.total_bytes) as u8
        };
        Self {
            percent,
            phase: UploadPhase::Upload,
        }
    }

    pub fn processing() -> Self {
        Self {
            percent: UPLOAD_PROGRESS_CAP,
            phase: UploadPhase::Process,
        }
    }
}

type ProgressSender = Arc<watch::Sender<Option<UploadProgress>>>;

/// Clears the progress slot when the upload ends, however it ends.
struct ProgressReset(ProgressSender);

impl Drop for ProgressReset {
    fn drop(&mut self) {
        self.0.send_replace(None);
    }
}

/// Drives validate → upload → process and yields an artifact only when every step succeeds.
pub struct UploadPipeline {
    gateway: Arc<dyn BackendGateway>,
    progress: ProgressSender,
}

impl UploadPipeline {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            gateway,
            progress: Arc::new(progress),
        }
    }

    /// Current upload progress; `None` while idle.
    pub fn progress(&self) -> Option<UploadProgress> {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UploadProgress>> {
        self.progress.subscribe()
    }

    pub async fn submit(&self, file: VideoFile) -> UploadResult<VideoArtifact> {
        validate(&file)?;

        let VideoFile {
            name,
            size_bytes,
            mime_type,
            bytes,
        } = file;

        let _reset = ProgressReset(self.progress.clone());
        self.progress.send_replace(Some(UploadProgress::uploading(TransferProgress {
            sent_bytes: 0,
            total_bytes: size_bytes,
        })));

        let sender = self.progress.clone();
        let on_progress: ProgressCallback = Arc::new(move |transfer| {
            sender.send_replace(Some(UploadProgress::uploading(transfer)));
        });

        tracing::debug!(name = %name, size_bytes, "starting video upload");
        let receipt = self
            .gateway
            .upload(
                UploadPayload {
                    file_name: name.clone(),
                    mime_type: mime_type.clone(),
                    bytes,
                },
                on_progress,
            )
            .await
            .inspect_err(|error| tracing::warn!(name = %name, error = %error, "video upload failed"))
            .context(PhaseSnafu {
                stage: "upload-phase",
                phase: UploadPhase::Upload,
            })?;

        self.progress.send_replace(Some(UploadProgress::processing()));
        tracing::debug!(
            server_filename = %receipt.server_filename,
            "upload accepted, starting processing"
        );

        let processed = self
            .gateway
            .process(&receipt.server_filename)
            .await
            .inspect_err(|error| {
                tracing::warn!(
                    server_filename = %receipt.server_filename,
                    error = %error,
                    "video processing failed"
                )
            })
            .context(PhaseSnafu {
                stage: "process-phase",
                phase: UploadPhase::Process,
            })?;

        self.progress.send_replace(Some(UploadProgress {
            percent: 100,
            phase: UploadPhase::Process,
        }));

        Ok(VideoArtifact::assemble(
            name, size_bytes, mime_type, receipt, processed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime_type: &str) -> VideoFile {
        VideoFile::new(name, mime_type, vec![0; 4])
    }

    #[test]
    fn accepts_by_mime_type_or_extension() {
        assert!(validate(&file("clip.mp4", "video/mp4")).is_ok());
        assert!(validate(&file("clip", "video/quicktime")).is_ok());
        assert!(validate(&file("CLIP.MKV", "")).is_ok());
        assert!(validate(&file("movie.mov", "application/octet-stream")).is_ok());
    }

    #[test]
    fn rejects_other_files() {
        let error = validate(&file("notes.txt", "text/plain")).expect_err("txt is rejected");
        assert!(error.is_validation());
        assert_eq!(error.phase(), None);
        assert!(validate(&file(".mp4", "")).is_err());
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(mime_type_for("a.MOV"), "video/quicktime");
        assert_eq!(mime_type_for("a.avi"), "video/avi");
        assert_eq!(mime_type_for("readme"), "application/octet-stream");
    }

    #[test]
    fn upload_percent_is_capped() {
        let at = |sent_bytes, total_bytes| {
            UploadProgress::uploading(TransferProgress {
                sent_bytes,
                total_bytes,
            })
            .percent
        };
        assert_eq!(at(0, 100), 0);
        assert_eq!(at(50, 100), 45);
        assert_eq!(at(100, 100), UPLOAD_PROGRESS_CAP);
        assert_eq!(at(500, 100), UPLOAD_PROGRESS_CAP);
        assert_eq!(at(0, 0), UPLOAD_PROGRESS_CAP);
        assert_eq!(UploadProgress::processing().phase, UploadPhase::Process);
    }
}
