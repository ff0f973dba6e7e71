use std::sync::Arc;

use snafu::{ResultExt, Snafu};
use tracing_subscriber::EnvFilter;
use vidchat::console;
use vidchat::settings::{SettingsError, SettingsStore};
use vidchat_core::Orchestrator;
use vidchat_gateway::{GatewayError, create_gateway};

#[derive(Debug, Snafu)]
enum AppError {
    #[snafu(display("failed to save settings on `{stage}`: {source}"))]
    SaveSettings {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("failed to set up the backend gateway on `{stage}`: {source}"))]
    Gateway {
        stage: &'static str,
        source: GatewayError,
    },
    #[snafu(display("failed to read console input on `{stage}`: {source}"))]
    Console {
        stage: &'static str,
        source: std::io::Error,
    },
}

/// Interactive video summarization chat.
///
/// Settings come from `<config dir>/vidchat/settings.json` and `VIDCHAT_*` environment
/// variables; `--write-config` saves the effective settings back to that file and exits.
#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Logs go to stderr so they never interleave with the transcript on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = SettingsStore::open_default();
    let settings = store.settings();

    if std::env::args().skip(1).any(|argument| argument == "--write-config") {
        store
            .save(settings.as_ref().clone())
            .context(SaveSettingsSnafu {
                stage: "write-config-flag",
            })?;
        println!("settings written to {}", store.path().display());
        return Ok(());
    }

    tracing::info!(base_url = %settings.backend.base_url, "starting video chat");
    let gateway = create_gateway(settings.backend.to_gateway_config()).context(GatewaySnafu {
        stage: "create-http-gateway",
    })?;
    let orchestrator = Arc::new(Orchestrator::new(gateway, settings.conversation.clone()));

    console::run(orchestrator).await.context(ConsoleSnafu {
        stage: "console-loop",
    })
}
