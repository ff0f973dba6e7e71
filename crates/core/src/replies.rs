//! Fixed assistant texts and the formatting of locally produced answers.

use super::artifact::VideoArtifact;

pub const GREETING: &str = "Hello! How can I help you summarize a video today?";
pub const HELLO_REPLY: &str = "Hello! I'm your video summarization assistant. Would you like to upload a video for me to analyze?";
pub const THANKS_REPLY: &str = "You're welcome! Let me know if you need anything else.";
pub const NO_FRAMES_REPLY: &str = "No frames have been extracted yet. Please upload a video first.";
pub const NO_VIDEO_SUMMARY_REPLY: &str =
    "There's no video to summarize yet. Please upload a video first.";
pub const NO_TRANSCRIPT_REPLY: &str =
    "No transcript is available yet. Please upload a video first.";
pub const UNKNOWN_LENGTH_REPLY: &str =
    "I've processed your video, but I don't have exact information about its length.";

pub const SUMMARY_PLACEHOLDER: &str = "Generating summary...";
pub const CHAT_PLACEHOLDER: &str = "Thinking...";

pub const SUMMARY_APOLOGY: &str =
    "Sorry, I couldn't generate a summary at this time. Please try again later.";
pub const CHAT_APOLOGY: &str =
    "Sorry, I couldn't reach the assistant right now. Please try again later.";
pub const CHAT_FALLBACK: &str = "Sorry, I didn't get an answer to that. Could you rephrase your question?";

const GREETING_WORDS: [&str; 3] = ["hello", "hi", "hey"];
const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Answers small talk locally, without the chat backend.
pub fn quick_reply(text: &str, artifact: Option<&VideoArtifact>) -> Option<String> {
    let words = lowercase_words(text);
    let has_word = |wanted: &str| words.iter().any(|word| word == wanted);

    if GREETING_WORDS.iter().any(|greeting| has_word(greeting)) {
        return Some(HELLO_REPLY.to_string());
    }
    if words.iter().any(|word| word.starts_with("thank")) {
        return Some(THANKS_REPLY.to_string());
    }
    if let Some(artifact) = artifact
        && has_word("how")
        && has_word("long")
    {
        return Some(length_reply(artifact));
    }

    None
}

fn lowercase_words(text: &str) -> Vec<String> {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn length_reply(artifact: &VideoArtifact) -> String {
    match artifact.duration_seconds() {
        Some(seconds) => format!(
            "Your video is approximately {} long.",
            format_duration(seconds)
        ),
        None => UNKNOWN_LENGTH_REPLY.to_string(),
    }
}

/// `45s`, `2m 05s`, `1h 02m 03s`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// The transcript itself, cut to `budget` characters with a notice when it is longer.
pub fn transcript_reply(transcript: &str, budget: usize) -> String {
    let total = transcript.chars().count();
    if total <= budget {
        return transcript.to_string();
    }

    let head = transcript.chars().take(budget).collect::<String>();
    format!(
        "{}...\n\n[Transcript truncated: showing the first {budget} of {total} characters.]",
        head.trim_end()
    )
}

pub fn frames_reply(artifact: Option<&VideoArtifact>) -> String {
    match artifact.map(|artifact| artifact.frames.len()) {
        Some(count) if count > 0 => format!(
            "I've extracted {count} key frames from the video. Would you like to see them?"
        ),
        _ => NO_FRAMES_REPLY.to_string(),
    }
}

pub fn upload_notice(file_name: &str) -> String {
    format!("I've uploaded \"{file_name}\" for summarization.")
}

/// Assistant message announcing a committed upload.
pub fn upload_report(artifact: &VideoArtifact) -> String {
    let megabytes = artifact.size_bytes as f64 / BYTES_PER_MEGABYTE;
    let mut lines = vec![
        format!(
            "I've successfully processed \"{}\" ({megabytes:.2} MB).",
            artifact.name
        ),
        String::new(),
        format!(
            "• Transcribed {} words across {} speech segments",
            artifact.word_count(),
            artifact.transcript_segments.len()
        ),
        format!(
            "• Extracted {} key frames from the video",
            artifact.frames.len()
        ),
    ];
    if artifact.summary.is_some() {
        lines.push("• Generated a detailed summary of the content".to_string());
    }
    lines.push(String::new());
    lines.push("What would you like to know about this video? You can ask me to:".to_string());
    lines.push("• Show you the summary".to_string());
    lines.push("• Show the transcript".to_string());
    lines.push("• Tell you about the key frames".to_string());

    lines.join("\n")
}
