//! Design summary for export.

use crate::asset::AssetKind;
use crate::design::Design;
use crate::gas::AgentDetail;
use crate::room::RoomSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Aggregate figures of a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub room: RoomSpec,
    /// Total room volume in m³, all three layers.
    pub volume: f64,
    pub line_detection_units: usize,
    pub point_detectors: usize,
    pub doors: usize,
    pub vents: usize,
    /// Sampling lines plus conduits, in metres.
    pub conduit_length: f64,
    pub extinguishing: String,
    pub nozzles: usize,
    /// Distribution pipework, in metres.
    pub pipe_length: f64,
    pub agents: BTreeMap<String, AgentDetail>,
}

impl ReportSummary {
    pub fn new(design: &Design) -> Self {
        let registry = design.registry();
        let config = design.config();
        let volume = design
            .gas()
            .map(|g| g.volume_total)
            .unwrap_or_else(|| config.room.volume());

        Self {
            room: config.room,
            volume,
            line_detection_units: registry.count(AssetKind::LineDetectionUnit),
            point_detectors: registry.count(AssetKind::PointDetector),
            doors: registry.count(AssetKind::Door),
            vents: registry.count(AssetKind::Vent),
            conduit_length: design.detection().conduit_length(),
            extinguishing: config.extinguishing.label().to_string(),
            nozzles: design.nozzles().len(),
            pipe_length: design.distribution().map(|d| d.pipe_length()).unwrap_or(0.0),
            agents: design.gas().map(|g| g.agent_details.clone()).unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write report to: {}", path.display()))
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read report from: {}", path.display()))
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let r = &self.room;
        writeln!(f, "Dimensions:            {} m x {} m", r.length, r.width)?;
        writeln!(f, "Total volume:          {:.2} m3", self.volume)?;
        writeln!(f, "Raised floor height:   {} m", r.height_fp)?;
        writeln!(f, "Occupied height:       {} m", r.height_amb)?;
        writeln!(f, "Suspended ceiling:     {} m", r.height_fc)?;
        writeln!(f, "Extinguishing system:  {}", self.extinguishing)?;
        writeln!(f, "Line-detection units:  {}", self.line_detection_units)?;
        writeln!(f, "Sampling pipework:     {:.1} m", self.conduit_length)?;
        writeln!(f, "Point detectors:       {}", self.point_detectors)?;
        writeln!(f, "Doors:                 {}", self.doors)?;
        writeln!(f, "Vents:                 {}", self.vents)?;
        if self.nozzles > 0 {
            writeln!(f, "Nozzles:               {}", self.nozzles)?;
            writeln!(f, "Distribution pipework: {:.1} m", self.pipe_length)?;
        }
        for (name, agent) in &self.agents {
            writeln!(
                f,
                "{:<22} {:.2} kg at {}%",
                format!("{}:", name),
                agent.mass_kg,
                agent.concentration_design
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DesignConfig, ExtinguishingSystem};
    use crate::pick::PlacementMode;
    use crate::room::Layer;
    use crate::{Point, Ray};
    use anyhow::anyhow;
    use std::time::Duration;
    use tempfile::tempdir;

    fn design() -> Result<Design> {
        let mut config = DesignConfig::new();
        config.extinguishing = ExtinguishingSystem::InertGas;
        let mut design = Design::with_local_service(config)?;
        let eye = Point::new(0.0, 10.0, 0.0);
        for (x, z) in [(1.0, 1.0), (3.0, 1.0)] {
            let ray = Ray::from_points(eye, Point::new(x, 0.0, z)).ok_or_else(|| anyhow!("bad ray"))?;
            design.click(&ray, PlacementMode::PointDetector(Layer::Occupied));
        }
        design.wait_for_gas(Duration::from_secs(5));
        Ok(design)
    }

    #[test]
    fn test_counts() -> Result<()> {
        let report = design()?.report();
        assert_eq!(report.point_detectors, 2);
        assert_eq!(report.line_detection_units, 0);
        assert_eq!(report.doors, 0);
        assert_eq!(report.volume, 800.0);
        assert_eq!(report.extinguishing, "IG55 (inert gas)");
        assert_eq!(report.conduit_length, 0.0);
        assert!(report.pipe_length > 0.0);
        assert_eq!(report.agents.len(), 2);

        let text = report.to_string();
        assert!(text.contains("Point detectors:       2"));
        assert!(text.contains("IG55 (inert gas)"));
        Ok(())
    }

    #[test]
    fn test_write_and_read_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.json");
        let original = design()?.report();
        original.write_json(&path)?;
        let loaded = ReportSummary::read_json(&path)?;
        assert_eq!(loaded.room, original.room);
        assert_eq!(loaded.point_detectors, original.point_detectors);
        assert_eq!(loaded.extinguishing, original.extinguishing);
        assert!((loaded.pipe_length - original.pipe_length).abs() < 1e-9);

        let json = original.to_json()?;
        assert!(json.contains("\"point_detectors\": 2"));
        assert_eq!(ReportSummary::from_json(&json)?.nozzles, original.nozzles);
        Ok(())
    }
}
