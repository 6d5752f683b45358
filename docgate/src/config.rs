//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `DOCGATE_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `DOCGATE_` override YAML values
//! 3. **Plain deployment variables** - `API_KEY`, `ALLOWED_ORIGINS`, `UPLOAD_DIR`, `MAX_UPLOAD_MB`,
//!    `OPENAI_API_KEY`, `OCR_SPACE_API_KEY`, `ESIGN_PROVIDER` and `PORT` are mapped onto their
//!    config keys, so existing deployments keep working without a config file
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `DOCGATE_OPENAI__MODEL=gpt-4o` sets the `openai.model` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use docgate::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Shared secret expected in the x-api-key header
//! API_KEY=change-me
//!
//! # Comma separated list of allowed browser origins
//! ALLOWED_ORIGINS="https://forms.example.com,https://admin.example.com"
//!
//! # Override nested values
//! DOCGATE_OCR__TIMEOUT=30s
//! DOCGATE_ACTIVITY_LOG__MAX_ENTRIES=500
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Plain environment variables understood without the `DOCGATE_` prefix, and the config key each
/// one sets. These are taken verbatim as strings, so an all-digit secret stays a secret.
const DEPLOYMENT_STRING_VARS: &[(&str, &str)] = &[
    ("API_KEY", "api_key"),
    ("ALLOWED_ORIGINS", "cors.allowed_origins"),
    ("UPLOAD_DIR", "uploads.dir"),
    ("OPENAI_API_KEY", "openai.api_key"),
    ("OCR_SPACE_API_KEY", "ocr.api_key"),
    ("ESIGN_PROVIDER", "esign.provider"),
];

/// Numeric deployment variables, parsed by figment.
const DEPLOYMENT_NUMERIC_VARS: &[(&str, &str)] = &[("MAX_UPLOAD_MB", "uploads.max_upload_mb"), ("PORT", "port")];

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DOCGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Built once at startup and then shared read-only through [`crate::AppState`]. All fields have
/// defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header. When unset every protected endpoint
    /// answers 401.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Externally visible base URL, used to build links to uploaded files. When unset the
    /// request's `Host` header is used.
    pub public_url: Option<Url>,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
    /// Upload store settings
    pub uploads: UploadsConfig,
    /// Chat completion upstream
    pub openai: OpenAiConfig,
    /// OCR upstream
    pub ocr: OcrConfig,
    /// E-signature provider selection
    pub esign: EsignConfig,
    /// Bounded activity log file
    pub activity_log: ActivityLogConfig,
    /// Expose Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests. Accepts a list or a comma separated string.
    #[serde(deserialize_with = "deserialize_origins")]
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// Where uploads land and how large they may be.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Directory uploaded files are written to (created on startup)
    pub dir: PathBuf,
    /// Maximum request body size for uploads, in megabytes
    pub max_upload_mb: u64,
}

impl UploadsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// OpenAI-compatible chat completion upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Bearer credential. Completion and extraction calls return empty results when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the API, without the `/chat/completions` suffix
    pub base_url: Url,
    /// Model identifier sent with every request
    pub model: String,
    /// Upper bound on a single completion call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// OCR upstream (ocr.space compatible form API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// API key sent as the `apikey` form field. OCR returns empty text when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Full URL of the parse endpoint
    pub url: Url,
    /// Upper bound on a single OCR call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// E-signature provider selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EsignConfig {
    /// Provider name, compared case-insensitively. Only `mock` is implemented.
    pub provider: String,
}

/// Activity log persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivityLogConfig {
    /// JSON file holding the log
    pub path: PathBuf,
    /// Number of entries retained; older entries are evicted first
    pub max_entries: usize,
}

/// A single allowed CORS origin.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

impl std::str::FromStr for CorsOrigin {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" { Ok(CorsOrigin::Wildcard) } else { Url::parse(s).map(CorsOrigin::Url) }
    }
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// `ALLOWED_ORIGINS` arrives as a single comma separated string, the YAML file as a list.
fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<CorsOrigin>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Origins {
        List(Vec<CorsOrigin>),
        Joined(String),
    }

    match Origins::deserialize(deserializer)? {
        Origins::List(list) => Ok(list),
        Origins::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<CorsOrigin>().map_err(serde::de::Error::custom))
            .collect(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_key: None,
            public_url: None,
            cors: CorsConfig::default(),
            uploads: UploadsConfig::default(),
            openai: OpenAiConfig::default(),
            ocr: OcrConfig::default(),
            esign: EsignConfig::default(),
            activity_log: ActivityLogConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            max_age: Some(3600),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_upload_mb: 16,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.openai.com/v1").expect("static URL is valid"),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: Url::parse("https://api.ocr.space/parse/image").expect("static URL is valid"),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Default for EsignConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
        }
    }
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("activity_log.json"),
            max_entries: 100,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.uploads.max_upload_mb == 0 {
            return Err(Error::Internal {
                operation: "Config validation: uploads.max_upload_mb must be greater than zero".to_string(),
            });
        }

        if self.activity_log.max_entries == 0 {
            return Err(Error::Internal {
                operation: "Config validation: activity_log.max_entries must be greater than zero".to_string(),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: cors.allowed_origins must list at least one origin (use '*' to allow all)"
                    .to_string(),
            });
        }

        if self.api_key.as_deref().is_none_or(str::is_empty) {
            tracing::warn!("No API key configured - every protected endpoint will answer 401");
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        let mut figment = Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values. DOCGATE_CONFIG names the
            // file itself and is not a config key.
            .merge(Env::prefixed("DOCGATE_").ignore(&["config"]).split("__"));

        // Plain deployment variables win over everything else
        for (var, key) in DEPLOYMENT_NUMERIC_VARS {
            figment = figment.merge(Env::raw().only(&[*var]).map(move |_| (*key).into()));
        }
        for (var, key) in DEPLOYMENT_STRING_VARS {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        figment
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configured API key, treating an empty string as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 8080);
            assert_eq!(config.host, "0.0.0.0");
            assert!(config.api_key.is_none());
            assert_eq!(config.uploads.max_upload_mb, 16);
            assert_eq!(config.openai.model, "gpt-4o-mini");
            assert_eq!(config.ocr.timeout, Duration::from_secs(60));
            assert_eq!(config.esign.provider, "mock");
            assert_eq!(config.activity_log.max_entries, 100);
            assert_eq!(config.cors.allowed_origins, vec![CorsOrigin::Wildcard]);

            Ok(())
        });
    }

    #[test]
    fn test_yaml_and_prefixed_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
openai:
  model: gpt-4o
  timeout: 30s
cors:
  allowed_origins:
    - https://forms.example.com
"#,
            )?;

            jail.set_env("DOCGATE_HOST", "127.0.0.1");
            jail.set_env("DOCGATE_OCR__TIMEOUT", "5s");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 9000);
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.openai.model, "gpt-4o");
            assert_eq!(config.openai.timeout, Duration::from_secs(30));
            assert_eq!(config.ocr.timeout, Duration::from_secs(5));
            assert_eq!(
                config.cors.allowed_origins,
                vec![CorsOrigin::Url(Url::parse("https://forms.example.com").unwrap())]
            );

            Ok(())
        });
    }

    #[test]
    fn test_deployment_env_vars() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 9000\n")?;

            jail.set_env("API_KEY", "s3cret");
            jail.set_env("PORT", "7070");
            jail.set_env("UPLOAD_DIR", "/srv/uploads");
            jail.set_env("MAX_UPLOAD_MB", "4");
            jail.set_env("OPENAI_API_KEY", "sk-test");
            jail.set_env("OCR_SPACE_API_KEY", "ocr-test");
            jail.set_env("ESIGN_PROVIDER", "docusign");
            jail.set_env("ALLOWED_ORIGINS", "https://a.example.com, https://b.example.com");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.api_key(), Some("s3cret"));
            assert_eq!(config.port, 7070);
            assert_eq!(config.uploads.dir, PathBuf::from("/srv/uploads"));
            assert_eq!(config.uploads.max_upload_mb, 4);
            assert_eq!(config.uploads.max_upload_bytes(), 4 * 1024 * 1024);
            assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.ocr.api_key.as_deref(), Some("ocr-test"));
            assert_eq!(config.esign.provider, "docusign");
            assert_eq!(config.cors.allowed_origins.len(), 2);

            Ok(())
        });
    }

    #[test]
    fn test_numeric_looking_strings_stay_strings() {
        Jail::expect_with(|jail| {
            jail.set_env("API_KEY", "123456");
            jail.set_env("OPENAI_API_KEY", "000123");
            jail.set_env("ESIGN_PROVIDER", "42");
            jail.set_env("UPLOAD_DIR", "2024");

            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.api_key(), Some("123456"));
            assert_eq!(config.openai.api_key.as_deref(), Some("000123"));
            assert_eq!(config.esign.provider, "42");
            assert_eq!(config.uploads.dir, PathBuf::from("2024"));

            Ok(())
        });
    }

    #[test]
    fn test_config_path_env_is_not_a_config_key() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "port: 9100\n")?;
            jail.set_env("DOCGATE_CONFIG", "custom.yaml");

            let config = Config::load(&args("custom.yaml"))?;
            assert_eq!(config.port, 9100);

            Ok(())
        });
    }

    #[test]
    fn test_wildcard_origin_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("ALLOWED_ORIGINS", "*");

            let config = Config::load(&args("missing.yaml"))?;
            assert_eq!(config.cors.allowed_origins, vec![CorsOrigin::Wildcard]);

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "not_a_field: true\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_empty_api_key_is_unset() {
        let config = Config {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_config_validation_zero_upload_limit() {
        let mut config = Config::default();
        config.uploads.max_upload_mb = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_upload_mb"));
    }

    #[test]
    fn test_config_validation_zero_log_capacity() {
        let mut config = Config::default();
        config.activity_log.max_entries = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_entries"));
    }

    #[test]
    fn test_config_validation_valid_config() {
        let config = Config {
            api_key: Some("key".to_string()),
            ..Default::default()
        };

        assert!(config.validate().is_ok());
    }
}
