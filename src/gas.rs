//! Extinguishing-agent quantities.
//!
//! The wire types match the JSON of the quantity service. The service may
//! be remote; [`LocalGasCalculator`] computes the same values in-process
//! and is used whenever no remote answer is available.

use crate::room::RoomSpec;
use anyhow::{Context, Result, bail};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

pub const FK_5_1_12: &str = "Novec 1230";
pub const HFC_227EA: &str = "FM-200";

/// Floor area served by one inert-gas cylinder and one nozzle.
pub const AREA_PER_CYLINDER: f64 = 30.0;
/// Floor area per water-mist tank module.
pub const AREA_PER_MIST_MODULE: f64 = 16.0;
/// Litres per module: 10 L/min for 30 min.
pub const LITRES_PER_MIST_MODULE: f64 = 10.0 * 30.0;

/// Design temperature when none is given, in °C.
pub const DEFAULT_TEMPERATURE: f64 = 20.0;

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasRequest {
    pub length: f64,
    pub width: f64,
    pub height_fp: f64,
    pub height_amb: f64,
    pub height_fc: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl GasRequest {
    pub fn from_room(spec: &RoomSpec, temperature: f64) -> Self {
        Self {
            length: spec.length,
            width: spec.width,
            height_fp: spec.height_fp,
            height_amb: spec.height_amb,
            height_fc: spec.height_fc,
            temperature,
        }
    }

    pub fn room(&self) -> RoomSpec {
        RoomSpec::new(self.length, self.width, self.height_fp, self.height_amb, self.height_fc)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize gas request")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentDetail {
    pub mass_kg: f64,
    /// Design concentration in volume percent.
    pub concentration_design: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtinctionSizing {
    pub ig55_cylinders: u32,
    pub ig55_nozzles: u32,
    pub hifog_tank_liters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasResponse {
    pub volume_total: f64,
    pub agent_details: BTreeMap<String, AgentDetail>,
    #[serde(default)]
    pub extinction_system: ExtinctionSizing,
}

impl GasResponse {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse gas response")
    }
}

/// Anything that can size the extinguishing agent for a room.
pub trait GasQuantityService: Send + Sync {
    fn calculate(&self, request: &GasRequest) -> Result<GasResponse>;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clean-agent mass `M = V * C / (100 - C) / S` with `S = k1 + k2 * T`.
fn agent_mass(volume: f64, concentration: f64, k1: f64, k2: f64, temperature: f64) -> f64 {
    let specific_volume = k1 + k2 * temperature;
    volume * (concentration / (100.0 - concentration)) / specific_volume
}

/// In-process quantity calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGasCalculator;

impl LocalGasCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Cylinder, nozzle and tank sizing for a floor area.
    pub fn sizing(area: f64) -> ExtinctionSizing {
        let per_30 = (area / AREA_PER_CYLINDER).ceil().max(0.0) as u32;
        ExtinctionSizing {
            ig55_cylinders: per_30,
            ig55_nozzles: per_30,
            hifog_tank_liters: ((area / AREA_PER_MIST_MODULE).max(1.0) * LITRES_PER_MIST_MODULE) as u32,
        }
    }
}

impl GasQuantityService for LocalGasCalculator {
    fn calculate(&self, request: &GasRequest) -> Result<GasResponse> {
        let room = request.room();
        room.validate().context("Invalid gas request")?;
        if !request.temperature.is_finite() {
            bail!("Temperature must be a finite number, got {}", request.temperature);
        }

        let volume = room.volume();
        let t = request.temperature;
        let agents = [(FK_5_1_12, 4.5, 0.0664, 0.000274), (HFC_227EA, 7.9, 0.1269, 0.000513)];

        let agent_details = agents
            .into_iter()
            .map(|(name, c, k1, k2)| {
                let detail = AgentDetail {
                    mass_kg: round2(agent_mass(volume, c, k1, k2, t)),
                    concentration_design: c,
                };
                (name.to_string(), detail)
            })
            .collect();

        Ok(GasResponse {
            volume_total: round2(volume),
            agent_details,
            extinction_system: Self::sizing(room.area()),
        })
    }
}

/// Result of one asynchronous request, tagged with its generation.
#[derive(Debug)]
pub struct GasUpdate {
    pub generation: u64,
    pub result: Result<GasResponse>,
}

/// Runs a quantity request on a worker thread.
pub struct GasRequestTask;

impl GasRequestTask {
    /// Detached: the result arrives on `outbox`, or nowhere if the receiver is gone.
    pub fn spawn(
        service: Arc<dyn GasQuantityService>,
        request: GasRequest,
        generation: u64,
        outbox: Sender<GasUpdate>,
    ) {
        thread::spawn(move || {
            debug!(generation, "gas request started");
            let result = service.calculate(&request);
            if outbox.send(GasUpdate { generation, result }).is_err() {
                warn!(generation, "gas response dropped, design no longer listening");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    #[test]
    fn test_reference_room() -> Result<()> {
        let req = GasRequest::from_room(&RoomSpec::new(20.0, 10.0, 0.5, 3.0, 0.5), 20.0);
        let resp = LocalGasCalculator::new().calculate(&req)?;
        assert_eq!(resp.volume_total, 800.0);

        let novec = resp.agent_details[FK_5_1_12];
        assert!((novec.mass_kg - 524.43).abs() < 1e-9);
        assert_eq!(novec.concentration_design, 4.5);
        let fm200 = resp.agent_details[HFC_227EA];
        assert!((fm200.mass_kg - 500.3).abs() < 1e-9);

        assert_eq!(resp.extinction_system.ig55_cylinders, 7);
        assert_eq!(resp.extinction_system.ig55_nozzles, 7);
        assert_eq!(resp.extinction_system.hifog_tank_liters, 3750);
        Ok(())
    }

    #[test]
    fn test_temperature_dependence() -> Result<()> {
        let req = GasRequest::from_room(&RoomSpec::new(12.0, 8.0, 0.5, 2.5, 0.5), 30.0);
        let resp = LocalGasCalculator::new().calculate(&req)?;
        assert!((resp.agent_details[FK_5_1_12].mass_kg - 212.17).abs() < 1e-9);
        assert!((resp.agent_details[HFC_227EA].mass_kg - 202.55).abs() < 1e-9);
        // small rooms still get one mist module
        assert_eq!(LocalGasCalculator::sizing(10.0).hifog_tank_liters, 300);
        Ok(())
    }

    #[test]
    fn test_invalid_request() {
        let req = GasRequest::from_room(&RoomSpec::new(0.0, 8.0, 0.5, 2.5, 0.5), 20.0);
        assert!(LocalGasCalculator::new().calculate(&req).is_err());
    }

    #[test]
    fn test_wire_format() -> Result<()> {
        let req: GasRequest = serde_json::from_str(
            r#"{"length": 20, "width": 10, "height_fp": 0.5, "height_amb": 3, "height_fc": 0.5}"#,
        )?;
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert!(req.to_json()?.contains("\"height_amb\":3.0"));

        let resp = GasResponse::from_json(
            r#"{
                "volume_total": 800.0,
                "agent_details": {"Novec 1230": {"mass_kg": 524.43, "concentration_design": 4.5}}
            }"#,
        )?;
        assert_eq!(resp.extinction_system, ExtinctionSizing::default());
        assert!(GasResponse::from_json("{}").is_err());
        Ok(())
    }

    #[test]
    fn test_task_posts_tagged_result() -> Result<()> {
        let (tx, rx) = unbounded();
        let req = GasRequest::from_room(&RoomSpec::default(), 20.0);
        GasRequestTask::spawn(Arc::new(LocalGasCalculator), req, 42, tx);
        let update = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(update.generation, 42);
        assert_eq!(update.result?.volume_total, 800.0);
        Ok(())
    }
}
