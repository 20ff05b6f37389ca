//! Resolver configuration.
//!
//! File names in the configuration may be relative; they are resolved against
//! `home_dir` before any file is opened.

use crate::error::{KeyError, Result};
use crate::signer::SigningPolicy;
use abeca_common::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base directory for relative file names
    #[serde(default)]
    pub home_dir: PathBuf,
    /// CA certificate (PEM)
    pub ca_file: PathBuf,
    /// Fallback private key (PEM), used when the store lacks the CA key
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(default)]
    pub signing: SigningPolicy,
    /// Installed by `KeyResolver::backed_signer_from_config`
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ResolverConfig {
    pub fn new(home_dir: impl Into<PathBuf>, ca_file: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            ca_file: ca_file.into(),
            ..Default::default()
        }
    }

    /// Read a JSON configuration file. A missing or relative `home_dir` is
    /// taken relative to the directory holding the file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| KeyError::io(path, e))?;
        let mut cfg: ResolverConfig = serde_json::from_slice(&raw)
            .map_err(|e| KeyError::from(e).context(format!("Invalid config file '{}'", path.display())))?;
        if let Some(dir) = path.parent() {
            cfg.home_dir = if cfg.home_dir.as_os_str().is_empty() {
                dir.to_path_buf()
            } else {
                make_file_abs(&cfg.home_dir, dir)
            };
        }
        cfg.make_file_names_absolute();
        Ok(cfg)
    }

    pub fn make_file_names_absolute(&mut self) {
        self.ca_file = make_file_abs(&self.ca_file, &self.home_dir);
        if let Some(key_file) = &self.key_file {
            self.key_file = Some(make_file_abs(key_file, &self.home_dir));
        }
    }
}

/// Resolve `file` against `dir` unless it is empty or already absolute
pub fn make_file_abs(file: &Path, dir: &Path) -> PathBuf {
    if file.as_os_str().is_empty() || file.is_absolute() {
        return file.to_path_buf();
    }
    dir.join(file)
}
