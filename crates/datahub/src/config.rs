//! Layered service configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! `DATAHUB_*` environment variables, command-line flags.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use datahub_store::{KeyDigest, StoreConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "DATAHUB_";
pub const DEFAULT_CONFIG_FILE: &str = "datahub.toml";

const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8300);
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("storage_dir is not set")]
    MissingStorageDir,

    #[error("storage_dir must be an absolute path, got '{0}'")]
    RelativeStorageDir(PathBuf),

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

/// Raw settings as merged from every source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub storage_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub max_upload_bytes: usize,
    pub key_digest: KeyDigest,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: None,
            staging_dir: None,
            listen_addr: SocketAddr::from(DEFAULT_LISTEN_ADDR),
            log_level: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            key_digest: KeyDigest::default(),
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Clone, Debug, Default, Serialize, Deserialize, clap::Args)]
pub struct Overrides {
    /// Root directory for dataset storage
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Address the HTTP service binds to
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    pub listen_addr: Option<SocketAddr>,

    /// Log level (error, warn, info, debug, trace)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl Settings {
    pub fn figment(config_file: &Path, overrides: &Overrides) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    pub fn load(config_file: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::figment(config_file, overrides)
            .extract()
            .map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// Settings the service cannot start without.
    pub fn validate(&self) -> Result<ServiceConfig, ConfigError> {
        let storage_dir = self
            .storage_dir
            .clone()
            .ok_or(ConfigError::MissingStorageDir)?;
        if !storage_dir.is_absolute() {
            return Err(ConfigError::RelativeStorageDir(storage_dir));
        }

        let mut store = StoreConfig::new(storage_dir).key_digest(self.key_digest);
        if let Some(staging) = &self.staging_dir {
            store = store.staging_dir(staging);
        }

        Ok(ServiceConfig {
            store,
            listen_addr: self.listen_addr,
            log_level: self.log_level()?,
            max_upload_bytes: self.max_upload_bytes,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub store: StoreConfig,
    pub listen_addr: SocketAddr,
    pub log_level: tracing::Level,
    pub max_upload_bytes: usize,
}
