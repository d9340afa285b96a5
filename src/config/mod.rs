//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "printworks";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REVIEWS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const DEFAULT_REVIEWS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_REVIEWS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAIL_API_BASE: &str = "https://api.resend.com/";
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 15;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 25 * 1024 * 1024;
const DEFAULT_CONTENT_DIR: &str = "content";

/// Command-line arguments for the Printworks binary.
#[derive(Debug, Parser)]
#[command(name = "printworks", version, about = "Printworks site backend")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PRINTWORKS_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Validate the content collections and exit.
    #[command(name = "check-content")]
    CheckContent(CheckContentArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Google place id used for live reviews.
    #[arg(long = "reviews-place-id", value_name = "ID")]
    pub reviews_place_id: Option<String>,

    /// Override the review cache TTL in seconds.
    #[arg(long = "reviews-cache-ttl-seconds", value_name = "SECONDS")]
    pub reviews_cache_ttl_seconds: Option<u64>,

    /// Override the quote-attachment directory.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the content collections directory.
    #[arg(long = "content-directory", value_name = "PATH")]
    pub content_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CheckContentArgs {
    /// Content directory to validate; defaults to the configured one.
    #[arg(value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub directory: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub reviews: ReviewsSettings,
    pub contact: ContactSettings,
    pub content: ContentSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ReviewsSettings {
    /// Place id of the studio's listing; absent means the live path is
    /// never attempted.
    pub place_id: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Url,
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub mail_api_base: Url,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    pub mail_to: String,
    pub mail_timeout: Duration,
    pub uploads_directory: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PRINTWORKS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckContent(args)) => {
            if let Some(directory) = args.directory.as_ref() {
                raw.content.directory = Some(directory.clone());
            }
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    reviews: RawReviewsSettings,
    contact: RawContactSettings,
    content: RawContentSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(place_id) = overrides.reviews_place_id.as_ref() {
            self.reviews.place_id = Some(place_id.clone());
        }
        if let Some(ttl) = overrides.reviews_cache_ttl_seconds {
            self.reviews.cache_ttl_seconds = Some(ttl);
        }
        if let Some(directory) = overrides.uploads_directory.as_ref() {
            self.contact.uploads_directory = Some(directory.clone());
        }
        if let Some(directory) = overrides.content_directory.as_ref() {
            self.content.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            reviews,
            contact,
            content,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            reviews: build_reviews_settings(reviews)?,
            contact: build_contact_settings(contact)?,
            content: build_content_settings(content),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let candidate = format!("{host}:{port}");
    let addr = candidate
        .parse()
        .map_err(|err| LoadError::invalid("server.addr", format!("invalid `{candidate}`: {err}")))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_reviews_settings(reviews: RawReviewsSettings) -> Result<ReviewsSettings, LoadError> {
    let place_id = non_blank(reviews.place_id);
    let api_key = non_blank(reviews.api_key);

    let endpoint_raw = reviews
        .endpoint
        .unwrap_or_else(|| DEFAULT_REVIEWS_ENDPOINT.to_string());
    let endpoint = Url::parse(&endpoint_raw)
        .map_err(|err| LoadError::invalid("reviews.endpoint", err.to_string()))?;

    let ttl_seconds = reviews
        .cache_ttl_seconds
        .unwrap_or(DEFAULT_REVIEWS_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "reviews.cache_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let timeout_seconds = reviews
        .timeout_seconds
        .unwrap_or(DEFAULT_REVIEWS_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "reviews.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ReviewsSettings {
        place_id,
        api_key,
        endpoint,
        cache_ttl: Duration::from_secs(ttl_seconds),
        timeout: Duration::from_secs(timeout_seconds),
    })
}

fn build_contact_settings(contact: RawContactSettings) -> Result<ContactSettings, LoadError> {
    let base_raw = contact
        .mail_api_base
        .unwrap_or_else(|| DEFAULT_MAIL_API_BASE.to_string());
    let mail_api_base = Url::parse(&base_raw)
        .map_err(|err| LoadError::invalid("contact.mail_api_base", err.to_string()))?;

    let timeout_seconds = contact
        .mail_timeout_seconds
        .unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "contact.mail_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let max_request_bytes_value = contact
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("contact.max_request_bytes", "must be greater than zero")
    })?;
    NonZeroUsize::new(max_request_bytes_value as usize).ok_or_else(|| {
        LoadError::invalid(
            "contact.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ContactSettings {
        mail_api_base,
        mail_api_key: non_blank(contact.mail_api_key),
        mail_from: contact
            .mail_from
            .unwrap_or_else(|| "quotes@printworks.example".to_string()),
        mail_to: contact
            .mail_to
            .unwrap_or_else(|| "studio@printworks.example".to_string()),
        mail_timeout: Duration::from_secs(timeout_seconds),
        uploads_directory: contact
            .uploads_directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
        max_request_bytes,
    })
}

fn build_content_settings(content: RawContentSettings) -> ContentSettings {
    ContentSettings {
        directory: content
            .directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawReviewsSettings {
    place_id: Option<String>,
    api_key: Option<String>,
    endpoint: Option<String>,
    cache_ttl_seconds: Option<u64>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContactSettings {
    mail_api_base: Option<String>,
    mail_api_key: Option<String>,
    mail_from: Option<String>,
    mail_to: Option<String>,
    mail_timeout_seconds: Option<u64>,
    uploads_directory: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    directory: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_serveable() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert!(settings.reviews.place_id.is_none());
        assert_eq!(
            settings.reviews.cache_ttl,
            Duration::from_secs(DEFAULT_REVIEWS_CACHE_TTL_SECS)
        );
        assert_eq!(
            settings.content.directory,
            PathBuf::from(DEFAULT_CONTENT_DIR)
        );
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn blank_place_id_is_treated_as_unset() {
        let mut raw = RawSettings::default();
        raw.reviews.place_id = Some("   ".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.reviews.place_id.is_none());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut raw = RawSettings::default();
        raw.reviews.cache_ttl_seconds = Some(0);
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "reviews.cache_ttl_seconds"
        ));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let mut raw = RawSettings::default();
        raw.reviews.endpoint = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["printworks"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "printworks",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--reviews-place-id",
            "ChIJexample",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.reviews_place_id.as_deref(),
                    Some("ChIJexample")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_check_content_arguments() {
        let args = CliArgs::parse_from(["printworks", "check-content", "/srv/content"]);
        match args.command.expect("check-content command") {
            Command::CheckContent(check) => {
                assert_eq!(
                    check.directory.as_deref(),
                    Some(std::path::Path::new("/srv/content"))
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
