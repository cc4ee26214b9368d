//! Application configuration management.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Hausset (`hausset.toml`).
///
/// Every section is optional; an empty file yields a working local setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the site runs. Decided once at startup.
    #[serde(default)]
    pub environment: Environment,

    /// Content API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Content source chain settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Contact relay settings.
    #[serde(default)]
    pub contact: ContactConfig,

    /// Mail transport settings.
    #[serde(default)]
    pub mail: MailConfig,

    /// Deploy helper settings.
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development machine with a reachable content API.
    #[default]
    Local,
    /// Deployed build, possibly on a static host without the API.
    Deployed,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Deployed => "deployed",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "development" | "dev" => Ok(Self::Local),
            "deployed" | "production" | "prod" => Ok(Self::Deployed),
            other => Err(CoreError::config(format!(
                "unknown environment '{other}' (expected 'local' or 'deployed')"
            ))),
        }
    }
}

/// Content API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `config/`, `problems/`, `products/` and `images/`.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Built front-end served for every non-API path, if set.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Key rate limits on the first `X-Forwarded-For` entry instead of the
    /// peer address. Enable only behind a reverse proxy that sets it.
    #[serde(default)]
    pub trust_proxy: bool,
}

/// Content source chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the content API (tier 1), e.g. `http://127.0.0.1:5000/api`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Remote static mirror (tier 2).
    #[serde(default)]
    pub mirror: Option<MirrorConfig>,
}

/// URLs of the three mirrored content documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub config_url: String,
    pub problems_url: String,
    pub products_url: String,
}

/// Contact relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Inbox receiving submissions.
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// Prepended to the submitted subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Per-client submission limit over a fixed window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Mail provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// No transport; every delivery reports the service unavailable.
    #[default]
    None,
    /// Plain SMTP relay with STARTTLS.
    Smtp,
    /// SendGrid SMTP relay authenticated by API key.
    Sendgrid,
    /// Mailgun SMTP relay.
    Mailgun,
    /// Keep messages in memory and log them.
    Outbox,
}

/// Mail transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub provider: MailProvider,

    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// SendGrid API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address; falls back to `username`, then to the recipient.
    #[serde(default)]
    pub from: Option<String>,
}

/// Deploy helper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Front-end project directory.
    #[serde(default = "default_client_dir")]
    pub client_dir: PathBuf,

    /// Shell command building the front-end, run inside `client_dir`.
    #[serde(default = "default_build_command")]
    pub build_command: String,

    /// Quiet period after a content change before rebuilding.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_api_base() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_recipient() -> String {
    "hello@hausset.com".to_string()
}

fn default_subject_prefix() -> String {
    "[Hausset Contact]".to_string()
}

fn default_max_submissions() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_client_dir() -> PathBuf {
    PathBuf::from("client")
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_debounce_ms() -> u64 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            content_dir: default_content_dir(),
            static_dir: None,
            trust_proxy: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            mirror: None,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            subject_prefix: default_subject_prefix(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::None,
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            api_key: None,
            from: None,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            client_dir: default_client_dir(),
            build_command: default_build_command(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration layered from an optional file and `HAUSSET__*`
    /// environment variables (e.g. `HAUSSET__MAIL__PASSWORD`).
    pub fn load_with_env(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("HAUSSET").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CoreError::config("server.port cannot be 0"));
        }

        if !is_http_url(&self.source.api_base) {
            return Err(CoreError::config(
                "source.api_base must start with http:// or https://",
            ));
        }

        if self.source.timeout_secs == 0 {
            return Err(CoreError::config("source.timeout_secs must be positive"));
        }

        if let Some(mirror) = &self.source.mirror {
            for (key, url) in [
                ("config_url", &mirror.config_url),
                ("problems_url", &mirror.problems_url),
                ("products_url", &mirror.products_url),
            ] {
                if !is_http_url(url) {
                    return Err(CoreError::config(format!(
                        "source.mirror.{key} must start with http:// or https://"
                    )));
                }
            }
        }

        if !self.contact.recipient.contains('@') {
            return Err(CoreError::config(
                "contact.recipient must be an email address",
            ));
        }

        let limit = &self.contact.rate_limit;
        if limit.max_submissions == 0 || limit.window_secs == 0 {
            return Err(CoreError::config(
                "contact.rate_limit values must be positive",
            ));
        }

        if self.source.api_base.ends_with('/') {
            tracing::warn!("source.api_base should not have a trailing slash");
        }

        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Absolute or relative path of a file under the content directory.
    pub fn content_path(&self, relative: &str) -> PathBuf {
        self.server.content_dir.join(relative)
    }
}
