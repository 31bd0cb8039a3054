use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use url::Url;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub webhooks: WebhookConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let webhooks = WebhookConfig {
            check_email: endpoint_from_env("REGISTRATION_CHECK_EMAIL")?,
            send_form: endpoint_from_env("REGISTRATION_SEND_FORM")?,
            send_qr: endpoint_from_env("REGISTRATION_SEND_QR")?,
        };

        let snapshot_dir = env::var("REGISTRATION_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".registration"));

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            webhooks,
            storage: StorageConfig { snapshot_dir },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the local key-value store keeps in-progress answers.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub snapshot_dir: PathBuf,
}

/// The three workflow triggers the submission pipeline talks to. Any of them may be absent;
/// the form submission endpoint is the only one a submit cannot do without.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub check_email: Option<WebhookEndpoint>,
    pub send_form: Option<WebhookEndpoint>,
    pub send_qr: Option<WebhookEndpoint>,
}

/// Base URL plus the shared access signature for a manually triggered workflow.
#[derive(Clone)]
pub struct WebhookEndpoint {
    pub base_url: Url,
    pub signature: String,
}

const TRIGGER_API_VERSION: &str = "2016-06-01";
const TRIGGER_PATH: &str = "/triggers/manual/run";
const TRIGGER_SIGNATURE_VERSION: &str = "1.0";

impl WebhookEndpoint {
    pub fn parse(raw_url: &str, signature: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(raw_url.trim())?,
            signature: signature.into(),
        })
    }

    /// Full trigger URL including the versioning and signature query parameters.
    pub fn trigger_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("api-version", TRIGGER_API_VERSION)
            .append_pair("sp", TRIGGER_PATH)
            .append_pair("sv", TRIGGER_SIGNATURE_VERSION)
            .append_pair("sig", &self.signature);
        url
    }
}

impl fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookEndpoint")
            .field("base_url", &self.base_url.as_str())
            .field("signature", &"<redacted>")
            .finish()
    }
}

fn endpoint_from_env(prefix: &str) -> Result<Option<WebhookEndpoint>, ConfigError> {
    let url_key = format!("{prefix}_API");
    let raw_url = match env::var(&url_key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return Ok(None),
    };
    let signature = env::var(format!("{prefix}_SIG")).unwrap_or_default();

    WebhookEndpoint::parse(&raw_url, signature)
        .map(Some)
        .map_err(|source| ConfigError::InvalidEndpoint {
            name: url_key,
            source,
        })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEndpoint { name: String, source: url::ParseError },
    MissingEndpoint(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEndpoint { name, .. } => {
                write!(f, "{name} must be an absolute URL")
            }
            ConfigError::MissingEndpoint(name) => write!(f, "{name} is not configured"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::MissingEndpoint(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidEndpoint { source, .. } => Some(source),
        }
    }
}
