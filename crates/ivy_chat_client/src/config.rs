//! Config load/save for `~/.ivy-chat/config.yaml` plus the required `MCM_URL`
//! environment variable.

use std::path::{Path, PathBuf};

/// Environment variable holding the default QA endpoint. The process refuses
/// to start without it.
pub const QA_URL_ENV: &str = "MCM_URL";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "IVY_CHAT_CONFIG";

pub const DEFAULT_API_KEY: &str = "123456789";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const TIMEOUT_STEP_SECS: u64 = 5;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_TYPING_DELAY_MS: u64 = 8;
pub const DEFAULT_USERNAME: &str = "Dummy Username";
pub const DEFAULT_SESSION_ID: &str = "0";

/// QA section (api_key, timeout_secs).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QaSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Server section (host, port, store_path, export_dir, typing_delay_ms).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_delay_ms: Option<u64>,
}

/// Identity placeholders used until a real login step exists.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IdentitySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub qa: QaSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub identity: IdentitySection,
}

impl Config {
    pub fn api_key(&self) -> String {
        self.qa
            .api_key
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string())
    }

    pub fn timeout_secs(&self) -> u64 {
        clamp_timeout_secs(self.qa.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn host(&self) -> String {
        self.server
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn typing_delay_ms(&self) -> u64 {
        self.server.typing_delay_ms.unwrap_or(DEFAULT_TYPING_DELAY_MS)
    }

    pub fn username(&self) -> String {
        self.identity
            .username
            .clone()
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    pub fn session_id(&self) -> String {
        self.identity
            .session_id
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
    }

    /// Store file from config, `~` expanded; falls back to `~/.ivy-chat/ivy-chat.db`.
    pub fn store_path(&self) -> Option<PathBuf> {
        match &self.server.store_path {
            Some(p) => Some(expand_home(p)),
            None => ivy_chat_dir().map(|d| d.join("ivy-chat.db")),
        }
    }

    /// Directory for exported CSV files; the OS temp dir unless configured.
    pub fn export_dir(&self) -> PathBuf {
        self.server
            .export_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Snap a timeout to the 5 s step and keep it within 5..=300 seconds.
pub fn clamp_timeout_secs(secs: u64) -> u64 {
    let snapped = (secs.saturating_add(TIMEOUT_STEP_SECS / 2) / TIMEOUT_STEP_SECS) * TIMEOUT_STEP_SECS;
    snapped.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

/// Read the required QA endpoint from `MCM_URL`. Unset or empty is an error.
pub fn required_qa_url() -> Result<String, ConfigError> {
    match std::env::var(QA_URL_ENV) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingEnv(QA_URL_ENV)),
    }
}

/// Returns the default config file path: `~/.ivy-chat/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    Some(ivy_chat_dir()?.join("config.yaml"))
}

/// Resolve config path from optional override, env, or default.
pub fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        return Some(p.to_path_buf());
    }
    if let Ok(val) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(val));
    }
    default_config_path()
}

fn ivy_chat_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".ivy-chat"))
}

fn expand_home(p: &str) -> PathBuf {
    match p.strip_prefix("~/") {
        Some(rest) => home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(p)),
        None => PathBuf::from(p),
    }
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file. Path is typically `~/.ivy-chat/config.yaml`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Like [`load`], but a missing file yields the default config.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save or environment error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("please set the {0} environment variable")]
    MissingEnv(&'static str),
}
