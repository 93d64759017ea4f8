//! Application configuration structs
//!
//! Loads configuration from environment variables with sensible defaults.
//! The collection names default to the canonical layout of the shared
//! group store and only need overriding when several groups share one
//! backing project.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Names of the remote collections and sentinel documents
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_chat_collection")]
    pub chat_collection: String,
    #[serde(default = "default_statistics_collection")]
    pub statistics_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    #[serde(default = "default_trophies_collection")]
    pub trophies_collection: String,
    #[serde(default = "default_settings_collection")]
    pub settings_collection: String,
    #[serde(default = "default_coins_collection")]
    pub coins_collection: String,
    #[serde(default = "default_sentinel_id")]
    pub sentinel_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chat_collection: default_chat_collection(),
            statistics_collection: default_statistics_collection(),
            users_collection: default_users_collection(),
            trophies_collection: default_trophies_collection(),
            settings_collection: default_settings_collection(),
            coins_collection: default_coins_collection(),
            sentinel_id: default_sentinel_id(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "study-sync".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_chat_collection() -> String {
    "globalChat".to_string()
}

fn default_statistics_collection() -> String {
    "statistics".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_trophies_collection() -> String {
    "trophies".to_string()
}

fn default_settings_collection() -> String {
    "groupSettings".to_string()
}

fn default_coins_collection() -> String {
    "coins".to_string()
}

fn default_sentinel_id() -> String {
    "default".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a present variable holds an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: match env::var("APP_ENV") {
                    Ok(s) => match s.to_lowercase().as_str() {
                        "production" => Environment::Production,
                        "staging" => Environment::Staging,
                        "development" => Environment::Development,
                        other => {
                            return Err(ConfigError::InvalidValue("APP_ENV", other.to_string()))
                        }
                    },
                    Err(_) => Environment::default(),
                },
            },
            store: StoreConfig {
                chat_collection: env::var("STORE_CHAT_COLLECTION")
                    .unwrap_or_else(|_| default_chat_collection()),
                statistics_collection: env::var("STORE_STATISTICS_COLLECTION")
                    .unwrap_or_else(|_| default_statistics_collection()),
                users_collection: env::var("STORE_USERS_COLLECTION")
                    .unwrap_or_else(|_| default_users_collection()),
                trophies_collection: env::var("STORE_TROPHIES_COLLECTION")
                    .unwrap_or_else(|_| default_trophies_collection()),
                settings_collection: env::var("STORE_SETTINGS_COLLECTION")
                    .unwrap_or_else(|_| default_settings_collection()),
                coins_collection: env::var("STORE_COINS_COLLECTION")
                    .unwrap_or_else(|_| default_coins_collection()),
                sentinel_id: env::var("STORE_SENTINEL_ID")
                    .unwrap_or_else(|_| default_sentinel_id()),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
