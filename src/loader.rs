use crate::{
    cloud::PointCloud,
    config::PointCloudConfig,
    error::{LabelError, Result},
};
use pcd_rs::{DynReader, Field};
use std::path::Path;
use tracing::info;

/// Reads a `.pcd` file into a [`PointCloud`].
///
/// The `x`, `y` and `z` fields are required. A packed `rgb` or `rgba` field
/// becomes per-point colors, otherwise the cloud is colorless.
pub fn load_pcd(path: impl AsRef<Path>, config: PointCloudConfig) -> Result<PointCloud> {
    let path = path.as_ref();
    let pcd_err = |reason: String| LabelError::Pcd {
        path: path.to_path_buf(),
        reason,
    };

    let reader = DynReader::open(path).map_err(|err| pcd_err(err.to_string()))?;

    let (x_idx, y_idx, z_idx, rgb_idx) = {
        let fields = &reader.meta().field_defs.fields;
        let position = |name: &str| {
            fields
                .iter()
                .position(|field| field.name.eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            position(name).ok_or_else(|| LabelError::MissingField {
                path: path.to_path_buf(),
                field: name.to_string(),
            })
        };
        (
            required("x")?,
            required("y")?,
            required("z")?,
            position("rgb").or_else(|| position("rgba")),
        )
    };

    let mut points = vec![];
    let mut colors = rgb_idx.map(|_| vec![]);

    for (idx, record) in reader.enumerate() {
        let record = record.map_err(|err| pcd_err(err.to_string()))?;
        let fields = &record.0;
        let coord = |field_idx: usize, axis: &str| {
            fields
                .get(field_idx)
                .and_then(first_value)
                .map(|v| v as f32)
                .ok_or_else(|| pcd_err(format!("point {idx} has no numeric '{axis}' value")))
        };
        points.push([coord(x_idx, "x")?, coord(y_idx, "y")?, coord(z_idx, "z")?]);

        if let (Some(colors), Some(rgb_idx)) = (colors.as_mut(), rgb_idx) {
            let rgb = fields
                .get(rgb_idx)
                .and_then(packed_rgb)
                .ok_or_else(|| pcd_err(format!("point {idx} has an unreadable color")))?;
            colors.push(rgb);
        }
    }

    let mut cloud = PointCloud::new(path, config);
    cloud.set_points(points);
    cloud.set_colors(colors)?;
    if cloud.config().center_on_load {
        let center = cloud.center().coords;
        cloud.set_init_translation(-center);
    }

    info!(
        "Loaded {} points ({}) from {}.",
        cloud.point_count(),
        if cloud.is_colorless() {
            "colorless"
        } else {
            "colored"
        },
        path.display()
    );
    cloud.log_details();
    Ok(cloud)
}

fn first_value(field: &Field) -> Option<f64> {
    let value = match field {
        Field::I8(values) => f64::from(*values.first()?),
        Field::I16(values) => f64::from(*values.first()?),
        Field::I32(values) => f64::from(*values.first()?),
        Field::U8(values) => f64::from(*values.first()?),
        Field::U16(values) => f64::from(*values.first()?),
        Field::U32(values) => f64::from(*values.first()?),
        Field::F32(values) => f64::from(*values.first()?),
        Field::F64(values) => *values.first()?,
    };
    Some(value)
}

/// Decodes PCL's packed `0x00RRGGBB` color, stored either as `U32` or
/// bit-cast into an `F32`.
fn packed_rgb(field: &Field) -> Option<[f32; 3]> {
    let bits = match field {
        Field::U32(values) => *values.first()?,
        Field::F32(values) => values.first()?.to_bits(),
        Field::I32(values) => *values.first()? as u32,
        _ => return None,
    };
    Some(unpack_rgb(bits))
}

pub(crate) fn unpack_rgb(bits: u32) -> [f32; 3] {
    let channel = |shift: u32| ((bits >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0)]
}
