use cloud_labeler::{
    BufferHandle, DrawPoints, LabelError, PointCloud, PointCloudConfig, RenderBackend,
    VertexLayout,
};
use nalgebra::Point3;

#[derive(Default)]
struct RecordingBackend {
    uploads: Vec<Vec<f32>>,
    draws: Vec<DrawPoints>,
}

impl RenderBackend for RecordingBackend {
    fn upload_buffer(&mut self, data: &[f32]) -> BufferHandle {
        self.uploads.push(data.to_vec());
        BufferHandle(self.uploads.len() as u32 - 1)
    }

    fn draw_points(&mut self, draw: &DrawPoints) -> cloud_labeler::Result<()> {
        self.draws.push(draw.clone());
        Ok(())
    }
}

fn config() -> PointCloudConfig {
    PointCloudConfig {
        point_size: 3.0,
        colorless_color: [0.2, 0.4, 0.6],
        center_on_load: false,
    }
}

#[test]
fn colored_cloud_uploads_interleaved_buffer_once() {
    let mut cloud = PointCloud::new("colored.pcd", config());
    cloud.set_points(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    cloud
        .set_colors(Some(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]))
        .unwrap();

    let mut backend = RecordingBackend::default();
    let handle = cloud.upload_buffer(&mut backend);
    cloud.render(&mut backend).unwrap();
    cloud.set_rot_z(45.0);
    cloud.render(&mut backend).unwrap();

    assert_eq!(
        backend.uploads,
        vec![vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0]]
    );
    assert_eq!(backend.draws.len(), 2);
    let draw = &backend.draws[0];
    assert_eq!(draw.buffer, handle);
    assert_eq!(draw.layout, VertexLayout::colored());
    assert_eq!(draw.count, 2);
    assert_eq!(draw.point_size, 3.0);
    assert_ne!(backend.draws[0].transform, backend.draws[1].transform);
}

#[test]
fn colorless_cloud_draws_with_fallback_color() {
    let mut cloud = PointCloud::new("plain.pcd", config());
    cloud.set_points(vec![[0.0, 0.0, 0.0], [4.0, 2.0, 0.0], [2.0, 1.0, 6.0]]);

    let mut backend = RecordingBackend::default();
    cloud.upload_buffer(&mut backend);
    cloud.render(&mut backend).unwrap();

    let draw = &backend.draws[0];
    assert_eq!(draw.layout, VertexLayout::colorless());
    assert_eq!(draw.layout.stride, 12);
    assert_eq!(draw.uniform_color, [0.2, 0.4, 0.6]);
    assert_eq!(draw.point_size, 1.0);
    assert_eq!(backend.uploads[0].len(), 9);
}

#[test]
fn render_before_upload_fails() {
    let mut cloud = PointCloud::new("late.pcd", config());
    cloud.set_points(vec![[1.0, 2.0, 3.0]]);
    let mut backend = RecordingBackend::default();
    let err = cloud.render(&mut backend).unwrap_err();
    assert!(matches!(err, LabelError::NotUploaded(_)));
    assert!(backend.draws.is_empty());
}

#[test]
fn drawn_transform_rotates_about_bounds_center() {
    let mut cloud = PointCloud::new("pivot.pcd", config());
    cloud.set_points(vec![[10.0, 10.0, 0.0], [12.0, 14.0, 2.0]]);
    cloud.set_rot_z(180.0);
    cloud.set_trans_x(-11.0);

    let mut backend = RecordingBackend::default();
    cloud.upload_buffer(&mut backend);
    cloud.render(&mut backend).unwrap();

    let transform = backend.draws[0].transform;
    let center = transform.transform_point(&Point3::new(11.0, 12.0, 1.0));
    assert!((center - Point3::new(0.0, 12.0, 1.0)).norm() < 1e-4);
    let corner = transform.transform_point(&Point3::new(10.0, 10.0, 0.0));
    assert!((corner - Point3::new(1.0, 14.0, 0.0)).norm() < 1e-4);
}
