//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;

/// Which route table the service exposes.
///
/// `Core` is the common info/health surface shared by every lab. `Storage`
/// additionally mounts the volume-demo routes (counter, write, read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Info, health, readiness, metrics, env and echo routes only.
    #[default]
    Core,
    /// Core routes plus the persistent counter and data-directory routes.
    Storage,
}

impl Profile {
    /// Whether the counter/write/read routes are mounted.
    pub fn storage_enabled(self) -> bool {
        self == Profile::Storage
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Identity ===
    /// Service name reported on the info routes.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Application version string.
    #[serde(default = "default_version")]
    pub app_version: String,

    // === Build Metadata ===
    /// CI build number.
    #[serde(default = "default_build_number")]
    pub build_number: String,

    /// CI build identifier.
    #[serde(default = "default_unknown")]
    pub build_id: String,

    /// VCS commit hash, as exported by Jenkins-style pipelines.
    #[serde(default = "default_unknown")]
    pub git_commit: String,

    /// VCS ref from Docker build args. Preferred over GIT_COMMIT when set.
    #[serde(default)]
    pub vcs_ref: Option<String>,

    /// Image build date.
    #[serde(default = "default_unknown")]
    pub build_date: String,

    /// Base image the container was built from.
    #[serde(default = "default_unknown")]
    pub base_image: String,

    // === Environment Label ===
    /// Deployment environment (CI/CD labs).
    #[serde(default)]
    pub environment: Option<String>,

    /// Deployment environment (Docker labs). ENVIRONMENT wins when both are set.
    #[serde(default)]
    pub app_env: Option<String>,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the counter file and written payloads.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Route table to expose: "core" or "storage".
    #[serde(default)]
    pub service_profile: Profile,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_app_name() -> String {
    "lab-info-service".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_build_number() -> String {
    "local".to_string()
}

fn default_unknown() -> String {
    "unknown".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/app/data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.is_empty() {
            return Err("APP_NAME must not be empty".to_string());
        }

        if self.app_version.is_empty() {
            return Err("APP_VERSION must not be empty".to_string());
        }

        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.service_profile.storage_enabled() && self.data_dir.as_os_str().is_empty() {
            return Err("DATA_DIR is required for the storage profile".to_string());
        }

        Ok(())
    }

    /// Effective environment label. ENVIRONMENT takes precedence over APP_ENV.
    pub fn environment_label(&self) -> &str {
        self.environment
            .as_deref()
            .or(self.app_env.as_deref())
            .unwrap_or("development")
    }

    /// Effective VCS commit, preferring VCS_REF over GIT_COMMIT.
    pub fn commit(&self) -> &str {
        self.vcs_ref.as_deref().unwrap_or(&self.git_commit)
    }

    /// Commit abbreviated to 7 characters, except the "unknown" placeholder.
    pub fn short_commit(&self) -> String {
        let commit = self.commit();
        if commit == "unknown" || commit.len() <= 7 {
            commit.to_string()
        } else {
            commit[..7].to_string()
        }
    }
}
