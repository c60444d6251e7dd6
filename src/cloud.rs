use crate::{
    backend::{BufferHandle, DrawPoints, RenderBackend, VertexLayout},
    bbox::wrap_degrees,
    config::PointCloudConfig,
    error::{LabelError, Result},
};
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A loaded point cloud together with its view transform.
///
/// Points and colors are owned here; the interleaved vertex buffer lives in
/// the render backend once [`PointCloud::upload_buffer`] ran.
#[derive(Debug, Clone)]
pub struct PointCloud {
    path: PathBuf,
    config: PointCloudConfig,
    points: Vec<[f32; 3]>,
    colors: Option<Vec<[f32; 3]>>,
    buffer: Option<BufferHandle>,
    mins: Point3<f32>,
    maxs: Point3<f32>,
    init_translation: Vector3<f32>,
    rot_x: f32,
    rot_y: f32,
    rot_z: f32,
    trans_x: f32,
    trans_y: f32,
    trans_z: f32,
}

impl PointCloud {
    pub fn new(path: impl Into<PathBuf>, config: PointCloudConfig) -> Self {
        Self {
            path: path.into(),
            config,
            points: vec![],
            colors: None,
            buffer: None,
            mins: Point3::origin(),
            maxs: Point3::origin(),
            init_translation: Vector3::zeros(),
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            trans_x: 0.0,
            trans_y: 0.0,
            trans_z: 0.0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &PointCloudConfig {
        &self.config
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn colors(&self) -> Option<&[[f32; 3]]> {
        self.colors.as_deref()
    }

    /// Replaces the points and recomputes the extrema.
    ///
    /// Colors set earlier are dropped since they no longer line up.
    pub fn set_points(&mut self, points: Vec<[f32; 3]>) {
        self.points = points;
        self.colors = None;
        self.buffer = None;
        self.set_mins_maxs();
    }

    pub fn set_colors(&mut self, colors: Option<Vec<[f32; 3]>>) -> Result<()> {
        if let Some(colors) = &colors {
            if colors.len() != self.points.len() {
                return Err(LabelError::ColorCount {
                    points: self.points.len(),
                    colors: colors.len(),
                });
            }
        }
        self.colors = colors;
        self.buffer = None;
        Ok(())
    }

    pub fn is_colorless(&self) -> bool {
        self.colors.is_none()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn color_count(&self) -> usize {
        self.colors.as_ref().map_or(0, Vec::len)
    }

    fn set_mins_maxs(&mut self) {
        let mut iter = self.points.iter().map(|&p| Point3::from(p));
        let Some(first) = iter.next() else {
            self.mins = Point3::origin();
            self.maxs = Point3::origin();
            return;
        };
        let (mins, maxs) = iter.fold((first, first), |(mins, maxs), p| {
            (mins.inf(&p), maxs.sup(&p))
        });
        self.mins = mins;
        self.maxs = maxs;
    }

    pub fn mins_maxs(&self) -> (Point3<f32>, Point3<f32>) {
        (self.mins, self.maxs)
    }

    /// Center of the axis-aligned bounds; rotations pivot around it.
    pub fn center(&self) -> Point3<f32> {
        self.mins + (self.maxs - self.mins) / 2.0
    }

    pub fn init_translation(&self) -> Vector3<f32> {
        self.init_translation
    }

    /// Records the translation restored by [`PointCloud::reset_translation`] and applies it.
    pub fn set_init_translation(&mut self, translation: Vector3<f32>) {
        self.init_translation = translation;
        self.reset_translation();
    }

    pub fn reset_translation(&mut self) {
        let [x, y, z]: [f32; 3] = self.init_translation.into();
        self.trans_x = x;
        self.trans_y = y;
        self.trans_z = z;
    }

    pub fn set_rot_x(&mut self, angle: f32) {
        self.rot_x = wrap_degrees(angle);
    }

    pub fn set_rot_y(&mut self, angle: f32) {
        self.rot_y = wrap_degrees(angle);
    }

    pub fn set_rot_z(&mut self, angle: f32) {
        self.rot_z = wrap_degrees(angle);
    }

    pub fn set_trans_x(&mut self, val: f32) {
        self.trans_x = val;
    }

    pub fn set_trans_y(&mut self, val: f32) {
        self.trans_y = val;
    }

    pub fn set_trans_z(&mut self, val: f32) {
        self.trans_z = val;
    }

    pub fn raw_rotations(&self) -> [f32; 3] {
        [self.rot_x, self.rot_y, self.rot_z]
    }

    pub fn raw_translations(&self) -> [f32; 3] {
        [self.trans_x, self.trans_y, self.trans_z]
    }

    /// Rotations in degrees rounded to one decimal, for display.
    pub fn rotations(&self) -> [f32; 3] {
        self.raw_rotations().map(|v| round_to(v, 1))
    }

    /// Translations rounded to four decimals, for display.
    pub fn translations(&self) -> [f32; 3] {
        self.raw_translations().map(|v| round_to(v, 4))
    }

    /// Flattens points, and colors if present, into one vertex array.
    pub fn interleaved(&self) -> Vec<f32> {
        match &self.colors {
            None => self.points.iter().flatten().copied().collect(),
            Some(colors) => self
                .points
                .iter()
                .zip(colors)
                .flat_map(|(point, color)| point.iter().chain(color))
                .copied()
                .collect(),
        }
    }

    pub fn layout(&self) -> VertexLayout {
        if self.is_colorless() {
            VertexLayout::colorless()
        } else {
            VertexLayout::colored()
        }
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn upload_buffer<B>(&mut self, backend: &mut B) -> BufferHandle
    where
        B: RenderBackend + ?Sized,
    {
        let data = self.interleaved();
        let handle = backend.upload_buffer(&data);
        debug!(
            "Uploaded {} floats for {} as {handle:?}",
            data.len(),
            self.path.display()
        );
        self.buffer = Some(handle);
        handle
    }

    /// Translation, then rotation about the bounds center in X, Y, Z order.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let translation = Vector3::new(self.trans_x, self.trans_y, self.trans_z);
        let pivot = self.center().coords;
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rot_x.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.rot_y.to_radians())
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.rot_z.to_radians());

        Matrix4::new_translation(&translation)
            * Matrix4::new_translation(&pivot)
            * rotation.to_homogeneous()
            * Matrix4::new_translation(&-pivot)
    }

    pub fn render<B>(&self, backend: &mut B) -> Result<()>
    where
        B: RenderBackend + ?Sized,
    {
        let buffer = self
            .buffer
            .ok_or_else(|| LabelError::NotUploaded(self.path.clone()))?;
        let point_size = if self.is_colorless() {
            1.0
        } else {
            self.config.point_size
        };

        backend.draw_points(&DrawPoints {
            buffer,
            transform: self.model_matrix(),
            layout: self.layout(),
            count: self.point_count(),
            point_size,
            uniform_color: self.config.colorless_color,
        })
    }

    pub fn log_details(&self) {
        info!("Point Cloud Center:\t{:.2?}", self.center());
        info!("Point Cloud Minimums:\t{:.2?}", self.mins);
        info!("Point Cloud Maximums:\t{:.2?}", self.maxs);
        info!("Initial Translation:\t{:.2?}", self.init_translation);
    }
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}
