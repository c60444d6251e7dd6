use itertools::iproduct;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};
use num_traits::Float;

/// Index pairs into [`BBox::corners`] forming the twelve box edges.
pub const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// An oriented 3D bounding box.
///
/// The center is the geometric centroid. Length runs along x, width along y
/// and height along z before rotation. Rotations are stored in degrees and
/// always lie in `[0, 360)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BBox {
    pub center_x: f64,
    pub center_y: f64,
    pub center_z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    x_rotation: f64,
    y_rotation: f64,
    z_rotation: f64,
    classname: String,
}

impl BBox {
    pub fn new(center: [f64; 3], dimensions: [f64; 3]) -> Self {
        let [center_x, center_y, center_z] = center;
        let [length, width, height] = dimensions;
        Self {
            center_x,
            center_y,
            center_z,
            length,
            width,
            height,
            x_rotation: 0.0,
            y_rotation: 0.0,
            z_rotation: 0.0,
            classname: String::new(),
        }
    }

    pub fn with_classname(mut self, classname: impl Into<String>) -> Self {
        self.set_classname(classname);
        self
    }

    pub fn center(&self) -> Point3<f64> {
        let Self {
            center_x,
            center_y,
            center_z,
            ..
        } = *self;
        Point3::new(center_x, center_y, center_z)
    }

    pub fn dimensions(&self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }

    pub fn classname(&self) -> &str {
        &self.classname
    }

    pub fn set_classname(&mut self, classname: impl Into<String>) {
        self.classname = classname.into();
    }

    pub fn rotations(&self) -> [f64; 3] {
        [self.x_rotation, self.y_rotation, self.z_rotation]
    }

    pub fn z_rotation(&self) -> f64 {
        self.z_rotation
    }

    pub fn set_rotations(&mut self, x: f64, y: f64, z: f64) {
        self.x_rotation = wrap_degrees(x);
        self.y_rotation = wrap_degrees(y);
        self.z_rotation = wrap_degrees(z);
    }

    pub fn set_z_rotation(&mut self, angle: f64) {
        self.z_rotation = wrap_degrees(angle);
    }

    pub fn pose(&self) -> Isometry3<f64> {
        let rotation = UnitQuaternion::from_euler_angles(
            self.x_rotation.to_radians(),
            self.y_rotation.to_radians(),
            self.z_rotation.to_radians(),
        );
        let translation = Translation3::new(self.center_x, self.center_y, self.center_z);
        Isometry3::from_parts(translation, rotation)
    }

    /// One box vertex; each flag picks the positive half-extent on its axis.
    pub fn vertex(&self, x_choice: bool, y_choice: bool, z_choice: bool) -> Point3<f64> {
        let point = {
            let x = self.length / 2.0 * if x_choice { 1.0 } else { -1.0 };
            let y = self.width / 2.0 * if y_choice { 1.0 } else { -1.0 };
            let z = self.height / 2.0 * if z_choice { 1.0 } else { -1.0 };
            Point3::new(x, y, z)
        };
        self.pose() * point
    }

    /// All eight vertices, ordered so that [`EDGES`] connects them.
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let mut corners = [Point3::origin(); 8];
        iproduct!([false, true], [false, true], [false, true])
            .enumerate()
            .for_each(|(idx, (x, y, z))| corners[idx] = self.vertex(x, y, z));
        corners
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> {
        let corners = self.corners();
        EDGES.into_iter().map(move |(a, b)| (corners[a], corners[b]))
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_degrees<T>(angle: T) -> T
where
    T: Float + From<f32>,
{
    let full = <T as From<f32>>::from(360.0);
    let wrapped = angle % full;
    let wrapped = if wrapped < T::zero() {
        wrapped + full
    } else {
        wrapped
    };
    // tiny negative inputs round up to the modulus
    if wrapped >= full {
        T::zero()
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_wrap_into_range() {
        let mut bbox = BBox::new([0.0; 3], [1.0; 3]);
        bbox.set_rotations(370.0, -10.0, 720.0);
        assert_eq!(bbox.rotations(), [10.0, 350.0, 0.0]);
    }

    #[test]
    fn corners_follow_yaw() {
        let mut bbox = BBox::new([1.0, 2.0, 3.0], [4.0, 2.0, 2.0]);
        bbox.set_z_rotation(90.0);
        let corner = bbox.vertex(true, false, true);
        // +x half-length maps onto +y after a quarter turn, -y half-width onto +x
        assert!((corner.x - 2.0).abs() < 1e-9);
        assert!((corner.y - 4.0).abs() < 1e-9);
        assert!((corner.z - 4.0).abs() < 1e-9);
    }

    #[test]
    fn edges_have_box_lengths() {
        let bbox = BBox::new([0.0; 3], [4.0, 2.0, 1.0]);
        let mut lengths: Vec<f64> = bbox.edges().map(|(a, b)| (a - b).norm()).collect();
        lengths.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(lengths.len(), 12);
        assert!(lengths[..4].iter().all(|l| (l - 1.0).abs() < 1e-9));
        assert!(lengths[4..8].iter().all(|l| (l - 2.0).abs() < 1e-9));
        assert!(lengths[8..].iter().all(|l| (l - 4.0).abs() < 1e-9));
    }
}
