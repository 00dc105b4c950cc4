use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{KmzError, Result};

const DEFAULT_STORAGE_DIR: &str = "/tmp/wpmz/kmz";

/// Settings for mission compilation and optional artifact persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Also write every produced KMZ to `kmz_storage_dir` (default: false)
    pub save_kmz_file: bool,

    /// Directory that receives saved KMZ files (default: `/tmp/wpmz/kmz`)
    pub kmz_storage_dir: PathBuf,

    /// Aircraft model code written to `droneInfo` (default: 78)
    pub drone_enum_value: u32,

    /// Aircraft sub-model code (default: 0)
    pub drone_sub_enum_value: u32,

    /// Gimbal/payload mount index used by payload and action parameters (default: 7)
    pub payload_position_index: u32,

    /// Mission speed when the first waypoint carries no usable speed (default: 10.0 m/s)
    pub default_speed: f64,

    /// Author recorded in the template document, if any
    pub author: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            save_kmz_file: false,
            kmz_storage_dir: default_storage_dir(),
            drone_enum_value: 78,
            drone_sub_enum_value: 0,
            payload_position_index: 7,
            default_speed: 10.0,
            author: None,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(KmzError::Config)
    }

    pub fn saving_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_kmz_file = true;
        self.kmz_storage_dir = dir.into();
        self
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}
