//! Persistent viewer settings, loaded from the user's config directory

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scales closer than this are treated as equal and skip rescaling
pub const DEFAULT_SCALE_EPSILON: f32 = 0.001;

const DEFAULT_RASTER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Rebuild threshold for scaled-page memoization
    #[serde(default = "default_scale_epsilon")]
    pub scale_epsilon: f32,
    /// How long to wait for the rasterizer worker before giving up on a page
    #[serde(default = "default_raster_timeout")]
    pub pdf_raster_timeout_secs: u64,
    /// Whether PDF documents are offered at all
    #[serde(default = "default_true")]
    pub pdf_enabled: bool,
}

fn default_scale_epsilon() -> f32 {
    DEFAULT_SCALE_EPSILON
}

fn default_raster_timeout() -> u64 {
    DEFAULT_RASTER_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scale_epsilon: default_scale_epsilon(),
            pdf_raster_timeout_secs: default_raster_timeout(),
            pdf_enabled: true,
        }
    }
}

impl Settings {
    pub fn raster_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_raster_timeout_secs)
    }

    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("egoview").join("config.toml"))
    }

    /// Load settings, falling back to defaults when the file is missing
    /// or unparseable. A broken config is worth a warning, not a refusal
    /// to start.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("failed to parse {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| anyhow::anyhow!("no config directory available"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
