//! Server configuration.
//!
//! Configuration is layered with the `config` crate:
//! 1. Bundled defaults (`keepsake.toml` shipped with the crate)
//! 2. User config in the home directory (`~/.config/keepsake/keepsake.toml`)
//! 3. User config in the current directory (`./keepsake.toml`), or an
//!    explicit file passed on the command line
//! 4. `KEEPSAKE_*` environment variables (e.g. `KEEPSAKE_MAX_UPLOAD_BYTES`)
//!
//! Later sources override earlier ones. Optional files are skipped silently.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use derive_getters::Getters;
use keepsake_error::{ConfigError, KeepsakeResult};
use keepsake_storage::{AllowedTypes, IngestOptions, IngestOptionsBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../keepsake.toml");

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct KeepsakeConfig {
    /// Directory uploads are stored in
    upload_dir: PathBuf,
    /// Listen address, e.g. "0.0.0.0:8000"
    bind: String,
    /// Largest accepted upload in bytes
    max_upload_bytes: u64,
    /// Bytes moved per read/write step
    chunk_size: usize,
    /// Bytes inspected for content sniffing
    sniff_len: usize,
    /// Prepended to stored file names
    #[serde(default)]
    filename_prefix: String,
    /// Accepted media types and their stored extensions
    #[serde(default)]
    allowed_types: AllowedTypes,
}

impl KeepsakeConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// `explicit` replaces the `./keepsake.toml` lookup and must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged result does
    /// not describe a valid configuration.
    pub fn load(explicit: Option<&Path>) -> KeepsakeResult<Self> {
        let mut builder = Self::defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/keepsake/keepsake.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match explicit {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("keepsake").required(false)),
        };

        builder = builder.add_source(Environment::with_prefix("KEEPSAKE").try_parsing(true));

        Self::finish(builder)
    }

    /// Load the bundled defaults overlaid with a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> KeepsakeResult<Self> {
        Self::finish(Self::defaults().add_source(File::from(path.as_ref())))
    }

    /// Replace the upload directory.
    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = upload_dir.into();
        self
    }

    /// Replace the listen address.
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Replace the upload ceiling.
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Ingestion options derived from this configuration.
    ///
    /// # Errors
    ///
    /// Returns a builder error for zero sizes or an unsafe prefix.
    pub fn ingest_options(&self) -> KeepsakeResult<IngestOptions> {
        IngestOptionsBuilder::default()
            .max_size_bytes(self.max_upload_bytes)
            .chunk_size(self.chunk_size)
            .sniff_len(self.sniff_len)
            .filename_prefix(self.filename_prefix.clone())
            .allowed_types(self.allowed_types.clone())
            .build()
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> KeepsakeResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        if config.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::new("upload_dir must not be empty").into());
        }
        if config.allowed_types.is_empty() {
            return Err(ConfigError::new("allowed_types must list at least one type").into());
        }

        Ok(config)
    }
}

impl Default for KeepsakeConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            bind: "0.0.0.0:8000".to_string(),
            max_upload_bytes: keepsake_storage::DEFAULT_MAX_UPLOAD_BYTES,
            chunk_size: keepsake_storage::DEFAULT_CHUNK_SIZE,
            sniff_len: keepsake_storage::SNIFF_LEN,
            filename_prefix: String::new(),
            allowed_types: AllowedTypes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_match_code_defaults() {
        let bundled = KeepsakeConfig::finish(KeepsakeConfig::defaults()).unwrap();
        assert_eq!(bundled, KeepsakeConfig::default());
    }
}
