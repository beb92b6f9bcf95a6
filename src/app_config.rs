//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with QUILLBOARD__, sections split by `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the database url and the session key stay in environment
//! variables (`DATABASE_URL`, `SECRET_KEY`), not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Quillboard".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind: String,
    /// Directory served under /static
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            static_dir: "./static".to_string(),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Lifetime of a normal login in minutes (default: 24 hours)
    pub session_timeout_minutes: u32,
    /// Lifetime of a "remember me" login in days
    pub remember_me_days: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: 1440,
            remember_me_days: 30,
        }
    }
}

/// Page sizes for every paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// POSTS_PER_PAGE: index, follows and search listings
    pub posts_per_page: u32,
    /// COMMENTS_PER_PAGE: comments under a post
    pub comments_per_page: u32,
    /// FOLLOWERS_PER_PAGE: followers and followed lists
    pub followers_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 20,
            comments_per_page: 30,
            followers_per_page: 50,
        }
    }
}

/// Administrator bootstrap
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Users registering with this email receive the Administrator role
    pub email: String,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub pagination: PaginationConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g. QUILLBOARD__PAGINATION__POSTS_PER_PAGE, QUILLBOARD__ADMIN__EMAIL
            .add_source(
                Environment::with_prefix("QUILLBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: site.name = {}, pagination = {:?}",
        config.site.name,
        config.pagination
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Replace the global configuration.
pub fn set_config(new_config: AppConfig) {
    if let Ok(mut config) = APP_CONFIG.write() {
        *config = new_config;
    }
}

pub fn site() -> SiteConfig {
    get_config().site
}

pub fn security() -> SecurityConfig {
    get_config().security
}

pub fn pagination() -> PaginationConfig {
    get_config().pagination
}

pub fn admin() -> AdminConfig {
    get_config().admin
}
