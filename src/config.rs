use crate::error::{LabelError, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub point_cloud: PointCloudConfig,
    pub label: LabelConfig,
}

impl Config {
    /// Loads a JSON config file. Absent keys keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| LabelError::io(path, err))?;
        serde_json::from_str(&text).map_err(|source| LabelError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PointCloudConfig {
    /// Point size used for colored clouds.
    pub point_size: f32,
    /// RGB in `[0, 1]` used for every point of a colorless cloud.
    pub colorless_color: [f32; 3],
    /// Move the cloud center to the origin when loading.
    pub center_on_load: bool,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            point_size: 4.0,
            colorless_color: [0.9, 0.9, 0.9],
            center_on_load: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub label_folder: PathBuf,
    /// Decimal places written for every exported number.
    pub export_precision: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            label_folder: PathBuf::from("labels"),
            export_precision: 8,
        }
    }
}
