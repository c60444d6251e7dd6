//! Point-cloud labeling core: oriented boxes, label files and a point-cloud
//! model that draws through a pluggable render backend.

pub mod backend;
pub mod bbox;
pub mod cloud;
pub mod config;
pub mod error;
pub mod label;
pub mod loader;

pub use backend::{BufferHandle, DrawPoints, RenderBackend, VertexLayout};
pub use bbox::BBox;
pub use cloud::PointCloud;
pub use config::{Config, LabelConfig, PointCloudConfig};
pub use error::{LabelError, Result};
pub use label::{LaconicFormat, LabelFormat};
pub use loader::load_pcd;
