// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Static configuration for the provisioning engine.
//!
//! The overlay list normally comes from the build-configuration service;
//! this file-backed form covers standalone use and tests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::{DEFAULT_DISABLED_SHELLS, Overlay, Overlays};
use crate::error::{IoContext, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Ordered overlay list, highest priority first.
    pub overlays: Vec<OverlayConfig>,

    /// Scratch directory for the search-path cache file.
    pub scratch_dir: Option<PathBuf>,

    /// Disabled-login shell sentinels.
    pub disabled_shells: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    pub name: String,
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlays: Vec::new(),
            scratch_dir: None,
            disabled_shells: DEFAULT_DISABLED_SHELLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl Overlays for Config {
    fn overlays(&self) -> Result<Vec<Overlay>> {
        Ok(self
            .overlays
            .iter()
            .map(|o| Overlay {
                name: o.name.clone(),
                path: o.path.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            scratch_dir = "/var/tmp/build/scratch"

            [[overlays]]
            name = "board"
            path = "/srv/overlays/board"

            [[overlays]]
            name = "base"
            path = "/srv/overlays/base"
            "#,
        )
        .unwrap();

        let overlays = config.overlays().unwrap();
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].name, "board");
        assert_eq!(
            config.scratch_dir.as_deref(),
            Some(Path::new("/var/tmp/build/scratch"))
        );
        // Defaults fill in the sentinel set.
        assert!(config.disabled_shells.contains(&"/bin/false".to_string()));
    }

    #[test]
    fn test_default_config_has_no_overlays() {
        let config = Config::default();
        assert!(config.overlays().unwrap().is_empty());
    }
}
