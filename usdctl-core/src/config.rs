//! Runtime configuration: where the USD toolchain lives and how wide
//! batches fan out.
//!
//! Every field is optional on disk; requiredness is enforced at resolution
//! time so a missing setting produces a reported error with a remediation
//! hint, never a silently chosen default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UsdError};

pub const ENV_USD_ROOT: &str = "USDCTL_USD_ROOT";
pub const ENV_WORKERS: &str = "USDCTL_WORKERS";

/// On-disk configuration, `<config dir>/usdctl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsdConfig {
    /// Root of the USD install (contains `bin/`, `lib/`, `lib/python`).
    pub usd_root: Option<PathBuf>,
    /// Concurrent conversions per batch.
    pub workers: Option<usize>,
    /// Viewer executable for `open --view`.
    pub viewer: Option<String>,
    /// Per-invocation timeout, seconds.
    pub timeout_secs: Option<u64>,
}

impl UsdConfig {
    /// Platform config file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("usdctl")
            .join("config.toml")
    }

    /// Load the config file (absent file is an empty config), then apply
    /// `USDCTL_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::from_file(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Parse `path` if it exists; a missing file is an empty config.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| UsdError::config(format!("cannot parse {}: {err}", path.display())))
    }

    /// Environment variables win over the config file; CLI flags are
    /// applied on top by the caller.
    pub fn apply_env(&mut self) {
        if let Ok(root) = std::env::var(ENV_USD_ROOT) {
            self.usd_root = Some(PathBuf::from(root));
        }
        if let Ok(workers) = std::env::var(ENV_WORKERS) {
            if let Ok(parsed) = workers.parse::<usize>() {
                self.workers = Some(parsed);
            }
        }
    }

    /// The USD root, or a configuration error telling the user how to set
    /// one.
    pub fn require_usd_root(&self) -> Result<&Path> {
        self.usd_root.as_deref().ok_or_else(|| {
            UsdError::config(format!(
                "usd_root is not set; pass --usd-root, set {ENV_USD_ROOT}, \
                 or run `usdctl config init`"
            ))
        })
    }

    /// The batch worker count, or a configuration error.
    pub fn require_workers(&self) -> Result<usize> {
        match self.workers {
            Some(0) => Err(UsdError::config("workers must be at least 1")),
            Some(count) => Ok(count),
            None => Err(UsdError::config(format!(
                "workers is not set; pass --workers, set {ENV_WORKERS}, \
                 or run `usdctl config init`"
            ))),
        }
    }

    /// Check that configured paths point at something plausible.
    pub fn validate_paths(&self) -> Result<()> {
        if let Some(root) = &self.usd_root {
            if !root.is_dir() {
                return Err(UsdError::config(format!(
                    "usd_root {} is not a directory",
                    root.display()
                )));
            }
        }
        Ok(())
    }
}
