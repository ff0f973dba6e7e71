use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One timed span of the transcript, in seconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A key frame reported by the processing backend.
///
/// The backend may send either a bare path (`"frame_00_01_05.png"`) or an object. Fields
/// this client does not understand are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FrameWire")]
pub struct FrameDescriptor {
    pub timestamp: Option<f64>,
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FrameDescriptor {
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            timestamp: timestamp_from_frame_name(&path),
            path: Some(path),
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrameWire {
    Path(String),
    Detailed {
        #[serde(default)]
        timestamp: Option<Value>,
        #[serde(default, alias = "url")]
        path: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<FrameWire> for FrameDescriptor {
    fn from(wire: FrameWire) -> Self {
        match wire {
            FrameWire::Path(path) => Self::from_path(path),
            FrameWire::Detailed {
                timestamp,
                path,
                mut extra,
            } => {
                let seconds = match &timestamp {
                    Some(Value::Number(number)) => number.as_f64(),
                    Some(Value::String(clock)) => parse_clock(clock),
                    _ => None,
                };
                // Unreadable timestamps are preserved verbatim rather than dropped.
                if seconds.is_none()
                    && let Some(raw) = timestamp
                    && !raw.is_null()
                {
                    extra.insert("timestamp".to_string(), raw);
                }

                Self {
                    timestamp: seconds.or_else(|| path.as_deref().and_then(timestamp_from_frame_name)),
                    path,
                    extra,
                }
            }
        }
    }
}

/// Parses `HH:MM:SS`, `HH_MM_SS`, `MM:SS` or plain seconds.
fn parse_clock(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<f64>() {
        return Some(seconds);
    }

    let parts = raw
        .split([':', '_'])
        .map(|part| part.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    Some(parts.iter().fold(0.0, |total, part| total * 60.0 + part))
}

/// Frame extraction names files `frame_HH_MM_SS.png`.
fn timestamp_from_frame_name(path: &str) -> Option<f64> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    let stem = file_name.split('.').next()?;
    let clock = stem.strip_prefix("frame_")?;
    parse_clock(clock)
}

/// Server-side handle for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub server_filename: String,
}

/// Artifacts produced by the processing endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedVideo {
    pub transcript_text: String,
    pub transcript_segments: Vec<TranscriptSegment>,
    pub frames: Vec<FrameDescriptor>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: context.into(),
        }
    }
}

/// Chat backend answer. `reply` may legitimately be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct FilenameBody<'a> {
    pub filename: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct UploadBody {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ProcessBody {
    #[serde(default)]
    pub transcript_text: Option<String>,
    #[serde(default)]
    pub transcript_segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub frames: Vec<FrameDescriptor>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct SummaryBody {
    #[serde(default)]
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_frame_path_yields_timestamp_from_name() {
        let frame: FrameDescriptor =
            serde_json::from_str("\"save/clip/frame_00_01_05.png\"").expect("frame");
        assert_eq!(frame.timestamp, Some(65.0));
        assert_eq!(frame.path.as_deref(), Some("save/clip/frame_00_01_05.png"));
    }

    #[test]
    fn detailed_frame_keeps_unknown_fields() {
        let frame: FrameDescriptor =
            serde_json::from_str(r#"{"timestamp": 12.5, "url": "/f/1.png", "score": 0.9}"#)
                .expect("frame");
        assert_eq!(frame.timestamp, Some(12.5));
        assert_eq!(frame.path.as_deref(), Some("/f/1.png"));
        assert_eq!(frame.extra.get("score"), Some(&Value::from(0.9)));
    }

    #[test]
    fn clock_string_timestamp_is_converted() {
        let frame: FrameDescriptor =
            serde_json::from_str(r#"{"timestamp": "01:02:03"}"#).expect("frame");
        assert_eq!(frame.timestamp, Some(3723.0));
        assert!(frame.extra.is_empty());
    }

    #[test]
    fn unreadable_timestamp_is_preserved_in_extra() {
        let frame: FrameDescriptor =
            serde_json::from_str(r#"{"timestamp": "intro"}"#).expect("frame");
        assert_eq!(frame.timestamp, None);
        assert_eq!(frame.extra.get("timestamp"), Some(&Value::from("intro")));
    }

    #[test]
    fn segments_tolerate_missing_fields() {
        let segment: TranscriptSegment = serde_json::from_str(r#"{"end": 4.0}"#).expect("segment");
        assert_eq!(segment, TranscriptSegment::new(0.0, 4.0, ""));
    }
}
