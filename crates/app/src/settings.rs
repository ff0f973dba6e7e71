use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use vidchat_core::ConversationSettings;
use vidchat_gateway::{DEFAULT_BASE_URL, GatewayConfig};

pub const SETTINGS_DIRECTORY_NAME: &str = "vidchat";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Environment overrides look like `VIDCHAT_BACKEND__BASE_URL`.
pub const ENV_PREFIX: &str = "VIDCHAT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl BackendSettings {
    pub fn normalized(mut self) -> Self {
        let base_url = self.base_url.trim().trim_end_matches('/');
        self.base_url = if base_url.is_empty() {
            default_base_url()
        } else {
            base_url.to_string()
        };
        self
    }

    pub fn to_gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.base_url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub conversation: ConversationSettings,
}

impl AppSettings {
    pub fn normalized(self) -> Self {
        Self {
            backend: self.backend.normalized(),
            conversation: self.conversation.normalized(),
        }
    }
}

/// `<config dir>/vidchat/settings.json`, or `.vidchat/settings.json` when the platform has
/// no config directory.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
        .unwrap_or_else(|| PathBuf::from(".vidchat"))
        .join(SETTINGS_FILE_NAME)
}

/// Layers: serialized defaults, then the JSON file, then `VIDCHAT_*` environment variables.
fn layered(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(AppSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Effective settings shared by the running app, plus where they are saved.
pub struct SettingsStore {
    current: ArcSwap<AppSettings>,
    path: PathBuf,
}

impl SettingsStore {
    /// Reads settings for `path`. A broken file is logged and replaced by defaults.
    pub fn open(path: PathBuf) -> Self {
        let settings = match layered(&path).extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "unreadable settings, using defaults"
                );
                AppSettings::default()
            }
        };
        Self {
            current: ArcSwap::from_pointee(settings),
            path,
        }
    }

    pub fn open_default() -> Self {
        Self::open(default_settings_path())
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.current.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalizes and writes `settings`, then makes them current.
    pub fn save(&self, settings: AppSettings) -> SettingsResult<()> {
        let settings = settings.normalized();
        let content = serde_json::to_string_pretty(&settings).context(EncodeSnafu {
            stage: "encode-settings",
        })?;
        write_atomically(&self.path, &content)?;
        tracing::info!(path = %self.path.display(), "saved settings");
        self.current.store(Arc::new(settings));
        Ok(())
    }
}

/// Writes through a sibling temp file so readers never observe a half-written file.
fn write_atomically(path: &Path, content: &str) -> SettingsResult<()> {
    if let Some(directory) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(directory).context(IoSnafu {
            stage: "create-settings-directory",
            path: directory,
        })?;
    }

    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, content).context(IoSnafu {
        stage: "write-staging-file",
        path: &staging,
    })?;
    std::fs::rename(&staging, path).context(IoSnafu {
        stage: "replace-settings-file",
        path,
    })
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to encode settings on `{stage}`: {source}"))]
    Encode {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("settings i/o on {path:?} failed on `{stage}`: {source}"))]
    Io {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
