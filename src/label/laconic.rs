use super::{abs2rel_rotation, rel2abs_rotation, LabelFolder, LabelFormat};
use crate::{
    bbox::BBox,
    config::LabelConfig,
    error::{LabelError, Result},
};
use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

const FIELD_COUNT: usize = 8;

/// KITTI-like labels in the LIDAR frame.
///
/// Each line holds `name x y z l w h rotation_z` where `(x, y, z)` is the
/// bottom-center point of the box, `l` runs along x, `w` along y, `h` along z,
/// and `rotation_z` is the yaw in radians within `[-pi, pi]`.
#[derive(Debug, Clone)]
pub struct LaconicFormat {
    folder: LabelFolder,
}

impl LaconicFormat {
    pub const FILE_ENDING: &'static str = ".txt";

    pub fn new(label_folder: impl Into<PathBuf>, export_precision: usize) -> Self {
        Self {
            folder: LabelFolder::new(label_folder, export_precision),
        }
    }

    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            folder: LabelFolder::from_config(config),
        }
    }

    pub fn label_path(&self, pcd_path: &Path) -> PathBuf {
        self.folder.label_path(pcd_path, Self::FILE_ENDING)
    }

    fn parse_line(path: &Path, line_no: usize, line: &str) -> Result<BBox> {
        let parse_err = |reason: String| LabelError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < FIELD_COUNT {
            return Err(parse_err(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            )));
        }

        let values: Vec<f64> = fields[1..FIELD_COUNT]
            .iter()
            .map(|text| match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(parse_err(format!("'{text}' is not a finite number"))),
                Err(_) => Err(parse_err(format!("'{text}' is not a number"))),
            })
            .try_collect()?;

        let (centroid, dimensions) = values[..6].split_at(3);
        let height = dimensions[2];
        let center = [centroid[0], centroid[1], centroid[2] + height / 2.0];
        let mut bbox = BBox::new(center, [dimensions[0], dimensions[1], height])
            .with_classname(fields[0]);
        bbox.set_rotations(0.0, 0.0, rel2abs_rotation(values[6]));
        Ok(bbox)
    }

    fn format_line(&self, index: usize, bbox: &BBox) -> Result<String> {
        let invalid = |reason: String| LabelError::InvalidLabel { index, reason };

        let classname = bbox.classname();
        if classname.is_empty() {
            return Err(invalid("class name is empty".to_string()));
        }
        if classname.chars().any(char::is_whitespace) {
            return Err(invalid(format!("class name '{classname}' contains whitespace")));
        }

        let center = bbox.center();
        let [length, width, height] = bbox.dimensions();
        let z_rotation = bbox.z_rotation();
        if let Some(value) = [center.x, center.y, center.z, length, width, height, z_rotation]
            .into_iter()
            .find(|v| !v.is_finite())
        {
            return Err(invalid(format!("{value} is not a finite number")));
        }
        let bottom_z = center.z - height / 2.0;

        let location = [center.x, center.y, bottom_z]
            .into_iter()
            .map(|v| self.folder.round_dec(v))
            .join(" ");
        let dimensions = [length, width, height]
            .into_iter()
            .map(|v| self.folder.round_dec(v))
            .join(" ");
        let rotation = self.folder.round_dec(abs2rel_rotation(z_rotation));

        Ok(format!("{classname} {location} {dimensions} {rotation}\n"))
    }
}

impl LabelFormat for LaconicFormat {
    fn import_labels(&self, pcd_path: &Path) -> Result<Vec<BBox>> {
        let label_path = self.label_path(pcd_path);
        if !label_path.is_file() {
            return Ok(vec![]);
        }

        let text =
            fs::read_to_string(&label_path).map_err(|err| LabelError::io(&label_path, err))?;
        let labels: Vec<BBox> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| Self::parse_line(&label_path, idx + 1, line))
            .try_collect()?;

        info!(
            "Imported {} labels from {}.",
            labels.len(),
            label_path.display()
        );
        Ok(labels)
    }

    fn export_labels(&self, bboxes: &[BBox], pcd_path: &Path) -> Result<PathBuf> {
        let data: String = bboxes
            .iter()
            .enumerate()
            .map(|(index, bbox)| self.format_line(index, bbox))
            .try_collect()?;

        let path = self
            .folder
            .save_label_to_file(pcd_path, Self::FILE_ENDING, &data)?;
        info!(
            "Exported {} labels to {} in laconic formatting!",
            bboxes.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cloud_labeler_laconic_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn parses_bottom_center_into_centroid() {
        let bbox = LaconicFormat::parse_line(
            Path::new("scan.txt"),
            1,
            "car 1.0 2.0 -1.5 4.0 2.0 1.5 0.0",
        )
        .unwrap();
        assert_eq!(bbox.classname(), "car");
        assert_eq!(bbox.center_z, -0.75);
        assert_eq!(bbox.dimensions(), [4.0, 2.0, 1.5]);
        assert_eq!(bbox.z_rotation(), 0.0);
    }

    #[test]
    fn short_line_reports_line_number() {
        let err = LaconicFormat::parse_line(Path::new("scan.txt"), 3, "car 1.0 2.0").unwrap_err();
        assert!(matches!(err, LabelError::Parse { line: 3, .. }));
        assert!(err.to_string().contains("expected 8 fields"));
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = LaconicFormat::parse_line(
            Path::new("scan.txt"),
            1,
            "car 1.0 2.0 zero 4.0 2.0 1.5 0.0",
        )
        .unwrap_err();
        assert!(err.to_string().contains("'zero' is not a number"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for line in ["car nan 2 0 4 2 2 0", "car 1 2 0 inf 2 2 0", "car 1 2 0 4 2 2 -infinity"] {
            let err = LaconicFormat::parse_line(Path::new("scan.txt"), 1, line).unwrap_err();
            assert!(err.to_string().contains("is not a finite number"), "{line}: {err}");
        }
    }

    #[test]
    fn unnamed_box_is_not_exported() {
        let dir = scratch_dir("export_unnamed");
        let format = LaconicFormat::new(&dir, 4);
        let bbox = BBox::new([1.0, 2.0, 1.0], [4.0, 2.0, 2.0]);

        let err = format
            .export_labels(&[bbox], Path::new("frame.pcd"))
            .unwrap_err();
        assert!(matches!(err, LabelError::InvalidLabel { index: 0, .. }));
        assert!(!format.label_path(Path::new("frame.pcd")).exists());
    }

    #[test]
    fn class_with_whitespace_is_not_exported() {
        let dir = scratch_dir("export_spaced");
        let format = LaconicFormat::new(&dir, 4);
        let named = BBox::new([0.0; 3], [1.0; 3]).with_classname("car");
        let spaced = BBox::new([0.0; 3], [1.0; 3]).with_classname("traffic sign");

        let err = format
            .export_labels(&[named, spaced], Path::new("frame.pcd"))
            .unwrap_err();
        assert!(matches!(err, LabelError::InvalidLabel { index: 1, .. }));
        assert!(err.to_string().contains("traffic sign"));
    }

    #[test]
    fn non_finite_box_is_not_exported() {
        let dir = scratch_dir("export_nan");
        let format = LaconicFormat::new(&dir, 4);
        let bbox = BBox::new([f64::NAN, 0.0, 0.0], [1.0; 3]).with_classname("car");

        let err = format
            .export_labels(&[bbox], Path::new("frame.pcd"))
            .unwrap_err();
        assert!(matches!(err, LabelError::InvalidLabel { index: 0, .. }));
    }

    #[test]
    fn missing_file_imports_nothing() {
        let format = LaconicFormat::new(scratch_dir("missing"), 8);
        let labels = format.import_labels(Path::new("nowhere.pcd")).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn export_writes_bottom_center_and_relative_rotation() {
        let dir = scratch_dir("export_line");
        let format = LaconicFormat::new(&dir, 4);
        let mut bbox = BBox::new([1.0, 2.0, 1.0], [4.0, 2.0, 2.0]).with_classname("truck");
        bbox.set_z_rotation(270.0);

        let path = format.export_labels(&[bbox], Path::new("frame.pcd")).unwrap();
        assert_eq!(path, dir.join("frame.txt"));
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "truck 1.0 2.0 0.0 4.0 2.0 2.0 -1.5708\n");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_export_writes_empty_file() {
        let dir = scratch_dir("export_empty");
        let format = LaconicFormat::new(&dir, 8);
        let path = format.export_labels(&[], Path::new("frame.pcd")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(format.import_labels(Path::new("frame.pcd")).unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
