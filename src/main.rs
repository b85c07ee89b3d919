use anyhow::{Result, anyhow};
use firesafe3d::{
    Design, DesignConfig, DetectionSystem, DoorStyle, ExtinguishingSystem, Layer, PlacementMode, Point, Ray,
    View,
};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

/// Usage: `firesafe3d [config.toml] [report.json]`
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => DesignConfig::load(Path::new(path))?,
        None => {
            let mut config = DesignConfig::new();
            config.detection.system = DetectionSystem::Aspirating;
            config.extinguishing = ExtinguishingSystem::InertGas;
            config.door_style = DoorStyle::Double;
            config
        }
    };

    let mut design = Design::with_local_service(config)?;
    let spec = *design.room().spec();
    info!(length = spec.length, width = spec.width, "design created");

    // Two line-detection units stacked on the -X wall
    let wall_x = -spec.length / 2.0;
    for y in [spec.floor_y() + 1.0, spec.floor_y() + 2.0] {
        let ray = Ray::from_points(Point::new(0.0, y, 0.0), Point::new(wall_x, y, 0.0))
            .ok_or_else(|| anyhow!("Degenerate pointer ray"))?;
        design.click(&ray, PlacementMode::LineDetectionUnit);
    }

    // Ceiling detectors picked through a camera looking down on the room
    let view = View::new(
        Point::new(0.0, spec.total_height() + 15.0, 0.01),
        Point::new(0.0, 0.0, 0.0),
        60f64.to_radians(),
        16.0 / 9.0,
    );
    for (nx, ny) in [(-0.5, 0.0), (0.0, 0.0), (0.5, 0.0)] {
        if let Some(ray) = view.ray_through(nx, ny) {
            design.click(&ray, PlacementMode::PointDetector(Layer::Occupied));
        }
    }

    // A door in the +Z wall, in the configured style
    let door_ray = Ray::from_points(Point::new(2.0, 1.5, 0.0), Point::new(2.0, 1.5, spec.width))
        .ok_or_else(|| anyhow!("Degenerate pointer ray"))?;
    design.place_door(&door_ray);

    if !design.wait_for_gas(Duration::from_secs(5)) {
        info!("no gas response, reporting local quantities");
    }

    let report = design.report();
    println!("{}", report);
    if let Some(path) = args.get(2) {
        report.write_json(Path::new(path))?;
        info!(path = path.as_str(), "report written");
    }
    Ok(())
}
