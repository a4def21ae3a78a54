// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ::config::{Config as ConfigFile, File, Environment};

use crate::models::Role;

/// Central configuration for the web server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web_server_addr: String,
    /// Development mode opens every guarded endpoint; never ship it
    pub deployment: DeploymentMode,
    pub session: SessionConfig,
    pub access: AccessConfig,

    // Static file serving configuration
    pub static_files: StaticFilesConfig,

    /// Accounts loaded into the user store at startup
    pub users: Vec<UserSeed>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_development(&self) -> bool {
        matches!(self, DeploymentMode::Development)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Development => f.write_str("development"),
            DeploymentMode::Production => f.write_str("production"),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            other => Err(format!("unknown deployment mode: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: i64,
    pub cleanup_interval_seconds: u64,
    pub secure_cookie: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Honor session shapes written by older login paths
    pub legacy_fallbacks: bool,
    /// Usernames granted admin from the embedded session user in production
    pub bootstrap_usernames: Vec<String>,
    /// Header set by the hosting platform on its internal requests
    pub platform_header: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
}

/// One account to create at startup; give either a PHC hash or a plaintext password
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSeed {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_server_addr: "127.0.0.1:8081".to_string(),
            deployment: DeploymentMode::Production,
            session: SessionConfig::default(),
            access: AccessConfig::default(),
            static_files: StaticFilesConfig::default(),
            users: Vec::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "realty_session".to_string(),
            ttl_seconds: 86400,
            cleanup_interval_seconds: 3600,
            secure_cookie: true,
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            legacy_fallbacks: true,
            bootstrap_usernames: vec!["admin".to_string(), "administrator".to_string()],
            platform_header: None,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            index: "index.html".to_string(),
        }
    }
}

/// The development profile is opt-in; an unset or blank RUN_MODE means production
fn run_mode_or_default(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "production".to_string())
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let run_mode = run_mode_or_default(env::var("RUN_MODE").ok());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        Self::load_from(&config_dir, &run_mode)
    }

    /// Layer `default.toml`, `{run_mode}.toml`, `local.toml` and `APP__*` variables
    pub fn load_from(config_dir: &Path, run_mode: &str) -> Result<Self, ::config::ConfigError> {
        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config: Config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables with prefix "APP", e.g. APP__SESSION__TTL_SECONDS
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        if config.deployment.is_development() {
            tracing::warn!(
                "Run mode {} selected the development deployment: admin endpoints are open to every request",
                run_mode
            );
        }

        Ok(config)
    }

    /// Load from files, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env()
            }
        }
    }

    fn from_plain_env() -> Self {
        let defaults = Self::default();

        let web_server_addr = env::var("WEB_SERVER_ADDR")
            .unwrap_or(defaults.web_server_addr);

        // Unknown values fall back to production
        let deployment = env::var("DEPLOYMENT_MODE")
            .ok()
            .and_then(|v| v.parse::<DeploymentMode>().ok())
            .unwrap_or(DeploymentMode::Production);

        let ttl_seconds = env::var("SESSION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults.session.ttl_seconds);

        let secure_cookie = env::var("SESSION_SECURE_COOKIE")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.session.secure_cookie);

        let legacy_fallbacks = env::var("LEGACY_SESSION_FALLBACKS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.access.legacy_fallbacks);

        let platform_header = env::var("PLATFORM_HEADER").ok().filter(|v| !v.is_empty());

        let static_files_path = env::var("STATIC_FILES_PATH")
            .unwrap_or(defaults.static_files.path);

        Self {
            web_server_addr,
            deployment,
            session: SessionConfig {
                ttl_seconds,
                secure_cookie,
                ..defaults.session
            },
            access: AccessConfig {
                legacy_fallbacks,
                platform_header,
                ..defaults.access
            },
            static_files: StaticFilesConfig {
                path: static_files_path,
                ..defaults.static_files
            },
            users: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_production() {
        let config = Config::default();
        assert_eq!(config.deployment, DeploymentMode::Production);
        assert!(config.access.platform_header.is_none());
        assert_eq!(config.session.cookie_name, "realty_session");
    }

    fn shipped_config_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../config")
    }

    #[test]
    fn test_unset_run_mode_loads_production() {
        assert_eq!(run_mode_or_default(None), "production");
        assert_eq!(run_mode_or_default(Some("  ".to_string())), "production");
        assert_eq!(run_mode_or_default(Some("Development".to_string())), "development");

        // Same path main takes: RUN_MODE absent, shipped config directory
        env::remove_var("RUN_MODE");
        env::set_var("CONFIG_DIR", shipped_config_dir());
        let config = Config::load().unwrap();
        env::remove_var("CONFIG_DIR");

        assert_eq!(config.deployment, DeploymentMode::Production);
        assert!(config.session.secure_cookie);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_development_profile_is_opt_in() {
        let config = Config::load_from(&shipped_config_dir(), "development").unwrap();
        assert_eq!(config.deployment, DeploymentMode::Development);
        assert!(!config.session.secure_cookie);
        assert_eq!(config.users.len(), 3);

        let config = Config::load_from(&shipped_config_dir(), "production").unwrap();
        assert_eq!(config.deployment, DeploymentMode::Production);
    }

    #[test]
    fn test_parse_deployment_mode() {
        assert_eq!("Development".parse::<DeploymentMode>(), Ok(DeploymentMode::Development));
        assert_eq!("prod".parse::<DeploymentMode>(), Ok(DeploymentMode::Production));
        assert!("staging".parse::<DeploymentMode>().is_err());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "deployment": "development",
            "session": { "ttl_seconds": 60 },
            "users": [{ "username": "broker", "password": "pw", "role": "agent" }]
        }))
        .unwrap();

        assert!(config.deployment.is_development());
        assert_eq!(config.session.ttl_seconds, 60);
        assert_eq!(config.session.cookie_name, "realty_session");
        assert_eq!(config.users[0].role, Role::Agent);
        assert!(config.access.legacy_fallbacks);
    }
}
