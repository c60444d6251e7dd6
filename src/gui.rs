use anyhow::{Context, Result};
use cloud_labeler::{
    backend::SIZE_OF_FLOAT,
    BBox, BufferHandle, DrawPoints, LabelError, LabelFormat, LaconicFormat, PointCloud,
    RenderBackend,
};
use kiss3d::{
    camera::{ArcBall, Camera},
    event::{Action, Key, Modifiers, WindowEvent},
    planar_camera::PlanarCamera,
    post_processing::PostProcessingEffect,
    text::Font,
    window::{State, Window},
};
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use palette::{FromColor, Hsv, Srgb};
use tracing::{error, info};

const ROTATION_STEP: f32 = 5.0;
const TRANSLATION_STEP: f32 = 0.5;

pub struct App {
    cloud: PointCloud,
    format: LaconicFormat,
    labels: Vec<BBox>,
    buffers: BufferStore,
    camera: ArcBall,
}

impl State for App {
    fn step(&mut self, window: &mut Window) {
        let result = self.try_step(window);
        if let Err(err) = result {
            error!("{err:#}");
            window.close();
        }
    }

    fn cameras_and_effect(
        &mut self,
    ) -> (
        Option<&mut dyn Camera>,
        Option<&mut dyn PlanarCamera>,
        Option<&mut dyn PostProcessingEffect>,
    ) {
        (Some(&mut self.camera), None, None)
    }
}

impl App {
    pub fn build(cloud: PointCloud, format: LaconicFormat) -> Result<Self> {
        let labels = format
            .import_labels(cloud.path())
            .with_context(|| format!("unable to import labels for {}", cloud.path().display()))?;

        let eye = Point3::from([0.0f32, -80.0, 32.0]);
        let at = Point3::origin();
        let mut camera = ArcBall::new(eye, at);
        camera.set_up_axis(Vector3::from([0.0, 0.0, 1.0]));

        Ok(Self {
            cloud,
            format,
            labels,
            buffers: BufferStore::default(),
            camera,
        })
    }

    fn try_step(&mut self, window: &mut Window) -> Result<()> {
        self.update(window)?;
        self.render(window)?;
        Ok(())
    }

    fn update(&mut self, window: &mut Window) -> Result<()> {
        let commands: Vec<Command> = window
            .events()
            .iter()
            .filter_map(|event| match event.value {
                WindowEvent::Key(key, Action::Press, modifiers) => Command::from_key(key, modifiers),
                _ => None,
            })
            .collect();

        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        use Command as C;

        let cloud = &mut self.cloud;
        let [rot_x, rot_y, rot_z] = cloud.raw_rotations();
        let [trans_x, trans_y, trans_z] = cloud.raw_translations();

        match command {
            C::RotateX(step) => cloud.set_rot_x(rot_x + step),
            C::RotateY(step) => cloud.set_rot_y(rot_y + step),
            C::RotateZ(step) => cloud.set_rot_z(rot_z + step),
            C::TranslateX(step) => cloud.set_trans_x(trans_x + step),
            C::TranslateY(step) => cloud.set_trans_y(trans_y + step),
            C::TranslateZ(step) => cloud.set_trans_z(trans_z + step),
            C::ResetTranslation => cloud.reset_translation(),
            C::Export => {
                let path = self
                    .format
                    .export_labels(&self.labels, cloud.path())
                    .context("unable to export labels")?;
                info!("Saved {} labels to {}", self.labels.len(), path.display());
            }
            C::Import => {
                self.labels = self
                    .format
                    .import_labels(cloud.path())
                    .context("unable to import labels")?;
            }
        }
        Ok(())
    }

    fn render(&mut self, window: &mut Window) -> Result<()> {
        let [rot_x, rot_y, rot_z] = self.cloud.rotations();
        let [trans_x, trans_y, trans_z] = self.cloud.translations();
        window.draw_text(
            &format!(
                "{}  labels: {}  rot: ({rot_x}, {rot_y}, {rot_z})  trans: ({trans_x}, {trans_y}, {trans_z})",
                self.cloud.path().display(),
                self.labels.len(),
            ),
            &Point2::from([5.0; 2]),
            40.0,
            &Font::default(),
            &Point3::from([0.0, 204.0, 0.0]),
        );

        let mut backend = WindowBackend {
            window: &mut *window,
            buffers: &mut self.buffers,
        };
        if self.cloud.buffer().is_none() {
            self.cloud.upload_buffer(&mut backend);
        }
        self.cloud.render(&mut backend)?;

        let transform = self.cloud.model_matrix();
        for bbox in &self.labels {
            draw_bbox(window, bbox, &transform);
        }
        draw_axes(window, 10.0);

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    RotateX(f32),
    RotateY(f32),
    RotateZ(f32),
    TranslateX(f32),
    TranslateY(f32),
    TranslateZ(f32),
    ResetTranslation,
    Export,
    Import,
}

impl Command {
    fn from_key(key: Key, modifiers: Modifiers) -> Option<Self> {
        use Command as C;
        use Key as K;

        let sign = if modifiers.contains(Modifiers::Shift) {
            -1.0
        } else {
            1.0
        };

        let command = match key {
            K::X => C::RotateX(sign * ROTATION_STEP),
            K::Y => C::RotateY(sign * ROTATION_STEP),
            K::Z => C::RotateZ(sign * ROTATION_STEP),
            K::Right => C::TranslateX(TRANSLATION_STEP),
            K::Left => C::TranslateX(-TRANSLATION_STEP),
            K::Up => C::TranslateY(TRANSLATION_STEP),
            K::Down => C::TranslateY(-TRANSLATION_STEP),
            K::PageUp => C::TranslateZ(TRANSLATION_STEP),
            K::PageDown => C::TranslateZ(-TRANSLATION_STEP),
            K::R => C::ResetTranslation,
            K::S => C::Export,
            K::L => C::Import,
            _ => return None,
        };
        Some(command)
    }
}

/// The vertex buffer of the displayed point cloud, kept alive across frames.
///
/// The viewer shows one cloud, so a new upload replaces the previous data.
#[derive(Debug, Default)]
struct BufferStore {
    data: Option<Vec<f32>>,
}

impl BufferStore {
    const HANDLE: BufferHandle = BufferHandle(0);

    fn upload(&mut self, data: &[f32]) -> BufferHandle {
        self.data = Some(data.to_vec());
        Self::HANDLE
    }

    fn get(&self, handle: BufferHandle) -> Option<&[f32]> {
        (handle == Self::HANDLE)
            .then_some(self.data.as_deref())
            .flatten()
    }
}

/// Draws uploaded buffers point by point through a kiss3d window.
struct WindowBackend<'a> {
    window: &'a mut Window,
    buffers: &'a mut BufferStore,
}

impl RenderBackend for WindowBackend<'_> {
    fn upload_buffer(&mut self, data: &[f32]) -> BufferHandle {
        self.buffers.upload(data)
    }

    fn draw_points(&mut self, draw: &DrawPoints) -> cloud_labeler::Result<()> {
        let data = self
            .buffers
            .get(draw.buffer)
            .ok_or_else(|| LabelError::Backend(format!("unknown buffer {:?}", draw.buffer)))?;

        let stride = draw.layout.floats_per_vertex();
        let position = draw.layout.position_offset / SIZE_OF_FLOAT;
        let color = draw
            .layout
            .color_offset
            .map(|offset| offset / SIZE_OF_FLOAT);
        let uniform_color = Point3::from(draw.uniform_color);

        self.window.set_point_size(draw.point_size);
        data.chunks_exact(stride).take(draw.count).for_each(|vertex| {
            let point = Point3::new(vertex[position], vertex[position + 1], vertex[position + 2]);
            let point = draw.transform.transform_point(&point);
            let color = match color {
                Some(offset) => Point3::new(vertex[offset], vertex[offset + 1], vertex[offset + 2]),
                None => uniform_color,
            };
            self.window.draw_point(&point, &color);
        });

        Ok(())
    }
}

fn draw_bbox(window: &mut Window, bbox: &BBox, transform: &Matrix4<f32>) {
    let color = class_color(bbox.classname());
    bbox.edges().for_each(|(from, to)| {
        let from = transform.transform_point(&from.cast::<f32>());
        let to = transform.transform_point(&to.cast::<f32>());
        window.draw_line(&from, &to, &color);
    });
}

fn draw_axes(window: &mut Window, length: f32) {
    let origin = Point3::origin();
    window.draw_line(&origin, &Point3::new(length, 0.0, 0.0), &Point3::new(1.0, 0.0, 0.0));
    window.draw_line(&origin, &Point3::new(0.0, length, 0.0), &Point3::new(0.0, 1.0, 0.0));
    window.draw_line(&origin, &Point3::new(0.0, 0.0, length), &Point3::new(0.0, 0.0, 1.0));
}

/// A stable hue per class name.
fn class_color(classname: &str) -> Point3<f32> {
    let hash = classname
        .bytes()
        .fold(0x811c9dc5u32, |hash, byte| (hash ^ byte as u32).wrapping_mul(0x01000193));
    let hue = (hash % 360) as f32;
    let (r, g, b) = Srgb::from_color(Hsv::new(hue, 1.0, 1.0)).into_components();
    Point3::from([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_reverses_rotation() {
        assert_eq!(
            Command::from_key(Key::Z, Modifiers::empty()),
            Some(Command::RotateZ(ROTATION_STEP))
        );
        assert_eq!(
            Command::from_key(Key::Z, Modifiers::Shift),
            Some(Command::RotateZ(-ROTATION_STEP))
        );
        assert_eq!(Command::from_key(Key::Space, Modifiers::empty()), None);
    }

    #[test]
    fn reupload_replaces_the_buffer() {
        let mut store = BufferStore::default();
        let first = store.upload(&[0.0, 1.0, 2.0]);
        let second = store.upload(&[3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(first, second);
        assert_eq!(store.get(second), Some(&[3.0, 4.0, 5.0, 6.0, 7.0, 8.0][..]));
        assert_eq!(store.get(BufferHandle(1)), None);
    }

    #[test]
    fn class_colors_are_stable() {
        assert_eq!(class_color("car"), class_color("car"));
        assert_ne!(class_color("car"), class_color("pedestrian"));
    }
}
