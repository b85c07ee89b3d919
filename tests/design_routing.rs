use anyhow::{Result, anyhow};
use firesafe3d::asset::UNIT_HEIGHT;
use firesafe3d::{
    Design, DesignConfig, DetectionConfig, DetectionSystem, ExtinguishingSystem, HasName, Layer, PlacementMode,
    Point, Ray, RoomSpec, UseCase,
};

fn aspirating_design() -> Result<Design> {
    let mut config = DesignConfig::new();
    config.room = RoomSpec::new(20.0, 10.0, 0.5, 3.0, 0.5);
    config.detection = DetectionConfig {
        system: DetectionSystem::Aspirating,
        layers: vec![Layer::Occupied],
    };
    Design::with_local_service(config)
}

/// Clicks the `-X` wall at height `y` and depth `z`.
fn place_unit(design: &mut Design, y: f64, z: f64) -> Result<Point> {
    let ray = Ray::from_points(Point::new(0.0, y, z), Point::new(-20.0, y, z)).ok_or_else(|| anyhow!("bad ray"))?;
    match design.click(&ray, PlacementMode::LineDetectionUnit) {
        Some(firesafe3d::pick::Committed::Placed(asset)) => Ok(asset.position()),
        other => Err(anyhow!("unit not placed: {:?}", other)),
    }
}

#[test]
fn test_stacked_units_route_to_lower_inlet() -> Result<()> {
    for order in [[2.5, 1.5], [1.5, 2.5]] {
        let mut design = aspirating_design()?;
        let first = place_unit(&mut design, order[0], 0.0)?;
        let second = place_unit(&mut design, order[1], 0.0)?;
        let (lower, upper) = if first.y < second.y { (first, second) } else { (second, first) };
        let lower_inlet = lower.with_y(lower.y + 0.2);
        let upper_bottom = upper.y - UNIT_HEIGHT / 2.0;
        let upper_top = upper.y + UNIT_HEIGHT / 2.0;

        let net = design.detection();
        assert_eq!(net.lines.len(), 2);
        assert_eq!(net.paths.len(), 4);

        for path in &net.paths {
            assert!(path.inlet.is_close(&lower_inlet));
            assert!(path.terminus().is_close(&lower_inlet));

            let drops: Vec<_> = path.segments.iter().filter(|s| s.is_vertical()).collect();
            assert!(
                drops
                    .iter()
                    .any(|s| s.y_range().1 <= upper_bottom + 1e-9 && s.y_range().0 < upper_bottom)
            );
            for s in &drops {
                let (lo, hi) = s.y_range();
                assert!(!(lo <= upper_bottom && hi >= upper_top), "segment crosses the upper unit");
            }
        }
    }
    Ok(())
}

#[test]
fn test_separate_stacks_route_independently() -> Result<()> {
    let mut design = aspirating_design()?;
    let a = place_unit(&mut design, 1.5, -4.0)?;
    let b = place_unit(&mut design, 1.5, 4.0)?;
    assert_eq!(design.registry().len(), 2);

    let net = design.detection();
    let to_a = net.paths.iter().filter(|p| p.inlet.is_close(&a.with_y(a.y + 0.2))).count();
    let to_b = net.paths.iter().filter(|p| p.inlet.is_close(&b.with_y(b.y + 0.2))).count();
    // each line end goes to the unit on its own side
    assert_eq!((to_a, to_b), (2, 2));
    Ok(())
}

#[test]
fn test_invalid_change_keeps_routes() -> Result<()> {
    let mut design = aspirating_design()?;
    place_unit(&mut design, 1.5, 0.0)?;
    let before = design.route_segments();

    assert!(design.set_room(RoomSpec::new(20.0, 10.0, 0.5, f64::NAN, 0.5)).is_err());
    assert_eq!(design.route_segments(), before);

    design.set_room(RoomSpec::new(24.0, 10.0, 0.5, 3.0, 0.5))?;
    assert_ne!(design.route_segments(), before);
    assert_eq!(design.registry().len(), 1);
    Ok(())
}

#[test]
fn test_datacenter_distribution_spine() -> Result<()> {
    let mut design = aspirating_design()?;
    design.set_use_case(UseCase::Datacenter(Default::default()))?;
    design.set_extinguishing(ExtinguishingSystem::InertGas)?;

    let nozzles = design.nozzles().to_vec();
    assert!(!nozzles.is_empty());
    let dist = design.distribution().ok_or_else(|| anyhow!("no distribution"))?;
    let spine = dist.spine.ok_or_else(|| anyhow!("no spine"))?;

    let z_min = nozzles.iter().map(|n| n.position.z).fold(f64::INFINITY, f64::min);
    let z_max = nozzles.iter().map(|n| n.position.z).fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(spine.z_min, z_min);
    assert_eq!(spine.z_max, z_max);
    assert_eq!(dist.branches.len(), nozzles.len());
    assert!(!design.layout().racks.is_empty());
    Ok(())
}

#[test]
fn test_delete_and_reuse_names() -> Result<()> {
    let mut design = aspirating_design()?;
    for z in [-3.0, 0.0, 3.0] {
        place_unit(&mut design, 1.5, z)?;
    }
    assert!(design.remove_by_name("LDU 2").is_some());
    place_unit(&mut design, 2.5, 0.0)?;

    let assets = design.assets();
    let names: Vec<&str> = assets.iter().map(|a| a.get_name()).collect();
    assert_eq!(names, vec!["LDU 1", "LDU 2", "LDU 3"]);

    // clicking the unit itself in delete mode removes it
    let target = design
        .registry()
        .find_by_name("LDU 3")
        .ok_or_else(|| anyhow!("missing unit"))?
        .position();
    let ray = Ray::from_points(Point::new(0.0, target.y, target.z), target).ok_or_else(|| anyhow!("bad ray"))?;
    design.click(&ray, PlacementMode::Delete);
    assert!(design.registry().find_by_name("LDU 3").is_none());
    assert_eq!(design.registry().len(), 2);
    Ok(())
}

#[test]
fn test_config_file_drives_design() -> Result<()> {
    let config = DesignConfig::from_toml_str(
        r#"
        extinguishing = "water_mist"

        [room]
        length = 12.0
        width = 8.0
        height_fp = 0.4
        height_amb = 2.8
        height_fc = 0.6

        [use_case]
        type = "hotel"
        cell_x = 4.0
        cell_z = 4.0
        "#,
    )?;
    let design = Design::with_local_service(config)?;
    assert_eq!(design.layout().cells.len(), 6);
    assert_eq!(design.nozzles().len(), 6);
    let dist = design.distribution().ok_or_else(|| anyhow!("no distribution"))?;
    assert!(dist.entry.is_close(&Point::new(6.0, 3.0, 0.0)));
    Ok(())
}
