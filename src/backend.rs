//! The seam between the point-cloud model and whatever draws it.

use crate::error::Result;
use nalgebra::Matrix4;

pub const SIZE_OF_FLOAT: usize = std::mem::size_of::<f32>();

/// Opaque handle to a vertex buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Byte layout of one vertex inside an uploaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub position_offset: usize,
    /// `None` when the buffer carries no per-vertex color.
    pub color_offset: Option<usize>,
}

impl VertexLayout {
    /// `[x, y, z]`
    pub fn colorless() -> Self {
        Self {
            stride: 3 * SIZE_OF_FLOAT,
            position_offset: 0,
            color_offset: None,
        }
    }

    /// `[x, y, z, r, g, b]`
    pub fn colored() -> Self {
        Self {
            stride: 6 * SIZE_OF_FLOAT,
            position_offset: 0,
            color_offset: Some(3 * SIZE_OF_FLOAT),
        }
    }

    pub fn floats_per_vertex(&self) -> usize {
        self.stride / SIZE_OF_FLOAT
    }
}

/// A single point-draw request.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPoints {
    pub buffer: BufferHandle,
    /// Model transform applied to every position.
    pub transform: Matrix4<f32>,
    pub layout: VertexLayout,
    pub count: usize,
    pub point_size: f32,
    /// Color for every point when the layout has no color attribute.
    pub uniform_color: [f32; 3],
}

pub trait RenderBackend {
    /// Stores `data` and returns a handle to it. The data is not modified afterwards.
    fn upload_buffer(&mut self, data: &[f32]) -> BufferHandle;

    fn draw_points(&mut self, draw: &DrawPoints) -> Result<()>;
}
