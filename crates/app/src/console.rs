//! Line-oriented front end: reads commands from stdin and redraws the conversation as it
//! changes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use vidchat_core::upload::UPLOAD_PROGRESS_CAP;
use vidchat_core::{Message, MessageId, Orchestrator, Sender, UploadPhase, UploadProgress, VideoFile};

pub const HELP: &str = "\
Commands:
  /upload <path>   upload and process a video (.mp4, .avi, .mov, .mkv)
  /reset           start a new conversation
  /help            show this help
  /quit            leave
Anything else is sent as a chat message.";

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Upload(PathBuf),
    Reset,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Say(line.to_string()));
        };

        let (name, argument) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, argument)| (name, argument.trim()));
        let command = match name.to_ascii_lowercase().as_str() {
            "upload" if !argument.is_empty() => Self::Upload(PathBuf::from(argument)),
            "reset" | "new" => Self::Reset,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Remembers what has been printed so only new or rewritten messages are shown again.
#[derive(Debug, Default)]
pub struct TranscriptView {
    printed: HashMap<MessageId, String>,
}

impl TranscriptView {
    pub fn refresh(&mut self, messages: &[Message]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut printed = HashMap::with_capacity(messages.len());

        for message in messages {
            match self.printed.get(&message.id) {
                Some(text) if *text == message.text => {}
                Some(_) => lines.push(render_message(message, true)),
                None => lines.push(render_message(message, false)),
            }
            printed.insert(message.id, message.text.clone());
        }

        self.printed = printed;
        lines
    }
}

pub fn render_message(message: &Message, updated: bool) -> String {
    let speaker = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    if updated {
        format!("[{speaker} ~] {}", message.text)
    } else {
        format!("[{speaker}] {}", message.text)
    }
}

pub fn render_progress(progress: UploadProgress) -> String {
    let percent = usize::from(progress.percent.min(100));
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    let label = match progress.phase {
        UploadPhase::Upload => "uploading",
        UploadPhase::Process if progress.percent <= UPLOAD_PROGRESS_CAP => "processing",
        UploadPhase::Process => "finishing",
    };
    format!(
        "[{}{}] {percent:>3}% {label}",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

/// Runs the prompt until `/quit` or end of input.
pub async fn run(orchestrator: Arc<Orchestrator>) -> std::io::Result<()> {
    let transcript = tokio::spawn(print_transcript(orchestrator.clone()));
    let progress = tokio::spawn(print_progress(orchestrator.upload_progress()));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Say(text) => {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator.send_user_message(&text).await;
                });
            }
            Command::Upload(path) => {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move { upload(&orchestrator, path).await });
            }
            Command::Reset => {
                println!("--- new conversation ---");
                orchestrator.reset().await;
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(line) => eprintln!("unknown command `{line}`; try /help"),
        }
    }

    transcript.abort();
    progress.abort();
    Ok(())
}

async fn upload(orchestrator: &Orchestrator, path: PathBuf) {
    let file = match VideoFile::read(&path).await {
        Ok(file) => file,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "failed to read video file");
            eprintln!("! could not read {}: {error}", path.display());
            return;
        }
    };

    if let Err(error) = orchestrator.upload_file(file).await {
        eprintln!("! upload failed: {error}");
    }
}

async fn print_transcript(orchestrator: Arc<Orchestrator>) {
    let mut revisions = orchestrator.subscribe();
    let mut view = TranscriptView::default();
    loop {
        let messages = orchestrator.messages().await;
        for line in view.refresh(&messages) {
            println!("{line}");
        }
        if revisions.changed().await.is_err() {
            break;
        }
    }
}

async fn print_progress(mut progress: watch::Receiver<Option<UploadProgress>>) {
    while progress.changed().await.is_ok() {
        let current = *progress.borrow_and_update();
        if let Some(current) = current {
            eprintln!("{}", render_progress(current));
        }
    }
}
