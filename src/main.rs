mod gui;

use anyhow::{Context, Result};
use clap::Parser;
use cloud_labeler::{load_pcd, Config, LaconicFormat};
use gui::App;
use kiss3d::{light::Light, window::Window};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// View a point cloud and edit its laconic bounding-box labels.
#[derive(Parser)]
struct Opts {
    /// The .pcd point cloud file to label.
    #[clap(long)]
    pub pcd: PathBuf,

    /// The directory that contains label files.
    #[clap(long)]
    pub label_dir: Option<PathBuf>,

    /// A JSON config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Set the plotted point size of colored clouds.
    #[clap(long)]
    pub point_size: Option<f32>,

    /// Decimal places written to exported labels.
    #[clap(long)]
    pub precision: Option<usize>,

    /// Move the point cloud center to the origin.
    #[clap(long)]
    pub center: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let Opts {
        pcd,
        label_dir,
        config,
        point_size,
        precision,
        center,
    } = Opts::parse();

    let mut config = match config {
        Some(path) => Config::from_path(&path)
            .with_context(|| format!("unable to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(label_dir) = label_dir {
        config.label.label_folder = label_dir;
    }
    if let Some(point_size) = point_size {
        config.point_cloud.point_size = point_size;
    }
    if let Some(precision) = precision {
        config.label.export_precision = precision;
    }
    config.point_cloud.center_on_load |= center;

    let cloud = load_pcd(&pcd, config.point_cloud.clone())
        .with_context(|| format!("unable to load {}", pcd.display()))?;
    let format = LaconicFormat::from_config(&config.label);

    let mut window = Window::new(env!("CARGO_BIN_NAME"));
    window.set_light(Light::StickToCamera);
    window.set_point_size(config.point_cloud.point_size);

    let state = App::build(cloud, format)?;
    window.render_loop(state);

    Ok(())
}
