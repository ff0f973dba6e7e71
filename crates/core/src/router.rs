use super::artifact::VideoArtifact;

/// What a free-text user message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ShowSummary,
    ShowTranscript,
    ShowFrames,
    GenericChat,
}

/// Classifies `text` with ordered keyword rules; the first matching rule wins.
///
/// Priority is summary, then transcript, then frames, then generic chat. The transcript
/// rule only fires when there is a non-empty transcript to show.
pub fn classify(text: &str, artifact: Option<&VideoArtifact>) -> Intent {
    let lowered = text.to_lowercase();

    if lowered.contains("summary") {
        Intent::ShowSummary
    } else if lowered.contains("transcript") && artifact.is_some_and(VideoArtifact::has_transcript) {
        Intent::ShowTranscript
    } else if lowered.contains("frame") || lowered.contains("timestamp") {
        Intent::ShowFrames
    } else {
        Intent::GenericChat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_transcript() -> VideoArtifact {
        VideoArtifact {
            transcript_text: Some("we talk about lifetimes".to_string()),
            ..VideoArtifact::default()
        }
    }

    #[test]
    fn summary_beats_every_other_keyword() {
        let artifact = with_transcript();
        assert_eq!(classify("summary frame", None), Intent::ShowSummary);
        assert_eq!(
            classify("transcript summary timestamp", Some(&artifact)),
            Intent::ShowSummary
        );
    }

    #[test]
    fn transcript_beats_frames_when_available() {
        let artifact = with_transcript();
        assert_eq!(
            classify("Transcript with FRAME numbers", Some(&artifact)),
            Intent::ShowTranscript
        );
    }

    #[test]
    fn transcript_requires_data() {
        assert_eq!(classify("show the transcript", None), Intent::GenericChat);
        assert_eq!(
            classify("show the transcript", Some(&VideoArtifact::default())),
            Intent::GenericChat
        );
        assert_eq!(classify("transcript and frames", None), Intent::ShowFrames);
    }

    #[test]
    fn frame_and_timestamp_keywords() {
        assert_eq!(classify("what about the frames", None), Intent::ShowFrames);
        assert_eq!(classify("any TIMESTAMPS?", None), Intent::ShowFrames);
    }

    #[test]
    fn everything_else_is_generic_chat() {
        assert_eq!(classify("hello", None), Intent::GenericChat);
        assert_eq!(classify("please summarize it", None), Intent::GenericChat);
    }

    #[test]
    fn classification_is_deterministic() {
        let artifact = with_transcript();
        for text in ["summary", "transcript", "frames", "why?"] {
            assert_eq!(
                classify(text, Some(&artifact)),
                classify(text, Some(&artifact))
            );
        }
    }
}
