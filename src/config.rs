//! Configuration persistence for the beatbox.
//!
//! Saves and loads settings to/from a YAML file. A missing file means
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pattern::DEFAULT_BPM;

/// Complete beatbox configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatBoxConfig {
    /// MIDI output device name (substring match)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Pattern file the Save/Load path box starts with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_file: Option<String>,
    /// Tempo every start returns to
    #[serde(default = "default_bpm")]
    pub base_bpm: f64,
    /// Multiplier applied by "tempo up"
    #[serde(default = "default_tempo_up")]
    pub tempo_up: f64,
    /// Multiplier applied by "tempo down"
    #[serde(default = "default_tempo_down")]
    pub tempo_down: f64,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn default_tempo_up() -> f64 {
    1.03
}

fn default_tempo_down() -> f64 {
    0.97
}

impl Default for BeatBoxConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            pattern_file: None,
            base_bpm: default_bpm(),
            tempo_up: default_tempo_up(),
            tempo_down: default_tempo_down(),
        }
    }
}

impl BeatBoxConfig {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        let project_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        project_dir.join("beatbox_config.yaml")
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML {}", path.display()))
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}
