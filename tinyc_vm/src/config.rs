//! The handful of knobs a deployment of this VM needs to tune without
//! recompiling: how big each call frame's local store is, and which shared
//! libraries to preload for native calls.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Default per-frame local-store size. Spec's own example figure — enough
/// headroom for hand-written programs without being wasteful per call.
pub const DEFAULT_LOCALS_CAPACITY: u64 = 65536;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub locals_capacity: u64,
    pub library_paths: Vec<PathBuf>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            locals_capacity: DEFAULT_LOCALS_CAPACITY,
            library_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VmConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Appends a `--lib PATH` flag's argument, as the CLI binary calls for
    /// each repeated occurrence.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_paths.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_example() {
        let config = VmConfig::default();
        assert_eq!(config.locals_capacity, 65536);
        assert!(config.library_paths.is_empty());
    }

    #[test]
    fn parses_partial_toml() {
        let config = VmConfig::from_toml_str("locals_capacity = 1024\n").unwrap();
        assert_eq!(config.locals_capacity, 1024);
    }

    #[test]
    fn with_library_accumulates_paths() {
        let config = VmConfig::default().with_library("a.so").with_library("b.so");
        assert_eq!(config.library_paths.len(), 2);
    }
}
