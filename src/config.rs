//! Configuration management for the house search backend
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::HouseSearchError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseSearchConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Mock listing generation settings
    #[serde(default)]
    pub listings: ListingsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix the API routes are nested under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Directory with the built frontend, served for non-API paths
    pub static_dir: Option<String>,
    /// Maximum accepted request body size
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// PEM certificate for HTTPS (requires the `tls` feature)
    pub tls_cert_path: Option<String>,
    /// PEM private key for HTTPS (requires the `tls` feature)
    pub tls_key_path: Option<String>,
}

/// Upstream provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the ip-api.com compatible geolocation service
    #[serde(default = "default_ip_location_base_url")]
    pub ip_location_base_url: String,
    /// Base URL of the OSRM compatible routing service
    #[serde(default = "default_routing_base_url")]
    pub routing_base_url: String,
    /// OSRM profile used for routes
    #[serde(default = "default_routing_profile")]
    pub routing_profile: String,
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    /// User agent sent to upstream providers
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Mock listing generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    /// Number of houses returned per request
    #[serde(default = "default_listing_count")]
    pub count: usize,
    /// Radius used when the client does not send one
    #[serde(default = "default_radius_meters")]
    pub default_radius_meters: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_body_limit() -> usize {
    16 * 1024
}

fn default_ip_location_base_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_routing_base_url() -> String {
    "http://router.project-osrm.org".to_string()
}

fn default_routing_profile() -> String {
    "driving".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("HouseSearch/{}", crate::VERSION)
}

fn default_listing_count() -> usize {
    50
}

fn default_radius_meters() -> f64 {
    7500.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            static_dir: None,
            body_limit_bytes: default_body_limit(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            ip_location_base_url: default_ip_location_base_url(),
            routing_base_url: default_routing_base_url(),
            routing_profile: default_routing_profile(),
            timeout_seconds: default_upstream_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            count: default_listing_count(),
            default_radius_meters: default_radius_meters(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for HouseSearchConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            listings: ListingsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HouseSearchConfig {
    /// Load configuration from file and environment variables
    ///
    /// The file is taken from `HOUSE_SEARCH_CONFIG` if set, otherwise from the
    /// user config directory, otherwise `config/default.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("HOUSE_SEARCH_CONFIG").map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config/default.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. HOUSE_SEARCH_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("HOUSE_SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Plain PORT, as set by most hosting platforms
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {port}"))?;
            builder = builder
                .set_override("server.port", i64::from(port))
                .with_context(|| "Failed to apply PORT override")?;
        }

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: HouseSearchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("house-search").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.body_limit_bytes == 0 {
            self.server.body_limit_bytes = default_body_limit();
        }
        if self.upstream.ip_location_base_url.is_empty() {
            self.upstream.ip_location_base_url = default_ip_location_base_url();
        }
        if self.upstream.routing_base_url.is_empty() {
            self.upstream.routing_base_url = default_routing_base_url();
        }
        if self.upstream.routing_profile.is_empty() {
            self.upstream.routing_profile = default_routing_profile();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_upstream_timeout();
        }
        if self.upstream.user_agent.is_empty() {
            self.upstream.user_agent = default_user_agent();
        }
        if self.listings.count == 0 {
            self.listings.count = default_listing_count();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_tls()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream.timeout_seconds > 300 {
            return Err(
                HouseSearchError::config("Upstream timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.listings.count > 10_000 {
            return Err(HouseSearchError::config("Listing count cannot exceed 10000").into());
        }

        let radius = self.listings.default_radius_meters;
        if !radius.is_finite() || radius <= 0.0 || radius > 100_000.0 {
            return Err(HouseSearchError::config(
                "Default radius must be greater than 0 and at most 100000 meters",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(HouseSearchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(HouseSearchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("ip_location_base_url", &self.upstream.ip_location_base_url),
            ("routing_base_url", &self.upstream.routing_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(HouseSearchError::config(format!(
                    "Upstream {name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(HouseSearchError::config("API prefix must start with '/'").into());
        }

        Ok(())
    }

    /// Certificate and key must be configured together
    fn validate_tls(&self) -> Result<()> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(_), None) | (None, Some(_)) => Err(HouseSearchError::config(
                "Both tls_cert_path and tls_key_path must be set to enable HTTPS",
            )
            .into()),
            _ => Ok(()),
        }
    }
}
