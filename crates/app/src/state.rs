use std::{fs, path::PathBuf};

use common::crypto::info::{algorithm, KeyMap};
use common::prelude::{CryptographyKey, EntityType, MetaType, PrivateKey};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "dimid";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Algorithm of the private key generated on init (ECC or RSA)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Default meta type for derived addresses ("1" MKM, "2" BTC, "4" ETH)
    #[serde(default = "default_meta_type")]
    pub meta_type: String,
    /// Default network byte for derived addresses
    #[serde(default)]
    pub network: u8,
    /// Default log level, overridable with RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_algorithm() -> String {
    algorithm::ECC.to_string()
}

fn default_meta_type() -> String {
    MetaType::Mkm.as_str().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            meta_type: default_meta_type(),
            network: EntityType::USER.0,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn meta_type(&self) -> Result<MetaType, StateError> {
        MetaType::parse(&self.meta_type).map_err(|e| StateError::InvalidConfig(e.to_string()))
    }

    pub fn network(&self) -> EntityType {
        EntityType(self.network)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the dimid directory (~/.dimid)
    pub dimid_dir: PathBuf,
    /// Path to the private key map
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the dimid directory path (custom or default ~/.dimid)
    pub fn dimid_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new dimid state directory with a fresh private key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let dimid_dir = Self::dimid_dir(custom_path)?;

        if dimid_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        // Validate the config before touching the filesystem
        let config = config.unwrap_or_default();
        config.meta_type()?;
        let key = PrivateKey::generate(&config.algorithm)
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;

        fs::create_dir_all(&dimid_dir)?;

        let key_path = dimid_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, serde_json::to_string_pretty(&key.to_map())?)?;

        let config_path = dimid_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            dimid_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the dimid directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dimid_dir = Self::dimid_dir(custom_path)?;

        if !dimid_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = dimid_dir.join(KEY_FILE_NAME);
        let config_path = dimid_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            dimid_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the private key from the key file
    pub fn load_key(&self) -> Result<PrivateKey, StateError> {
        let json = fs::read_to_string(&self.key_path)?;
        let map: KeyMap = serde_json::from_str(&json)?;
        let key = PrivateKey::parse(&map).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        // Key data is decoded lazily; surface a corrupt file here
        key.data().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("dimid directory not initialized. Run 'dimid init' first")]
    NotInitialized,

    #[error("dimid directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
