//! Label file formats.
//!
//! Every format stores one label file per point cloud, named after the point
//! cloud's file stem, inside a shared label folder.

mod laconic;

pub use laconic::LaconicFormat;

use crate::{
    bbox::BBox,
    config::LabelConfig,
    error::{LabelError, Result},
};
use std::{
    f64::consts::PI,
    fs,
    path::{Path, PathBuf},
};

/// Import and export of bounding boxes for a single point cloud.
pub trait LabelFormat {
    /// Reads the labels stored for `pcd_path`. A missing label file yields no labels.
    fn import_labels(&self, pcd_path: &Path) -> Result<Vec<BBox>>;

    /// Writes `bboxes` for `pcd_path` and returns the path of the label file.
    fn export_labels(&self, bboxes: &[BBox], pcd_path: &Path) -> Result<PathBuf>;
}

/// Label folder and numeric precision shared by the formats.
#[derive(Debug, Clone)]
pub struct LabelFolder {
    pub label_folder: PathBuf,
    pub export_precision: usize,
}

impl LabelFolder {
    pub fn new(label_folder: impl Into<PathBuf>, export_precision: usize) -> Self {
        Self {
            label_folder: label_folder.into(),
            export_precision,
        }
    }

    pub fn from_config(config: &LabelConfig) -> Self {
        Self::new(&config.label_folder, config.export_precision)
    }

    pub fn label_path(&self, pcd_path: &Path, file_ending: &str) -> PathBuf {
        let stem = pcd_path.file_stem().unwrap_or(pcd_path.as_os_str());
        let mut name = stem.to_os_string();
        name.push(file_ending);
        self.label_folder.join(name)
    }

    pub fn round_dec(&self, value: f64) -> String {
        format_decimal(value, self.export_precision)
    }

    pub fn save_label_to_file(
        &self,
        pcd_path: &Path,
        file_ending: &str,
        data: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.label_folder)
            .map_err(|err| LabelError::io(&self.label_folder, err))?;
        let path = self.label_path(pcd_path, file_ending);
        fs::write(&path, data).map_err(|err| LabelError::io(&path, err))?;
        Ok(path)
    }
}

/// Converts a rotation in radians within `[-pi, pi]` into degrees within `[0, 360)`.
pub fn rel2abs_rotation(rel_rotation: f64) -> f64 {
    let abs_rotation = rel_rotation.to_degrees();
    if abs_rotation < 0.0 {
        abs_rotation + 360.0
    } else {
        abs_rotation
    }
}

/// Converts degrees within `[0, 360)` into radians within `(-pi, pi]`.
pub fn abs2rel_rotation(abs_rotation: f64) -> f64 {
    let rel_rotation = abs_rotation.to_radians();
    if rel_rotation > PI {
        rel_rotation - 2.0 * PI
    } else {
        rel_rotation
    }
}

/// Formats `value` rounded to `precision` decimal places.
///
/// Trailing zeros are dropped but one fractional digit is always kept, so
/// `1` becomes `1.0` and `2.50` becomes `2.5`. The output never depends on
/// the process locale.
pub fn format_decimal(value: f64, precision: usize) -> String {
    let rounded = format!("{value:.precision$}");
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = match frac_part.trim_end_matches('0') {
        "" => "0",
        digits => digits,
    };
    let int_part = match (int_part, frac_part) {
        ("-0", "0") => "0",
        _ => int_part,
    };
    format!("{int_part}.{frac_part}")
}
