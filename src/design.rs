//! Design context.
//!
//! [`Design`] owns the inputs of one room design and everything derived from
//! them. Derived state (surfaces, layout, detection network, distribution
//! network) is always rebuilt from scratch. A change that fails validation
//! is rejected and the previous state stays in place.

use crate::asset::{AssetKind, AssetRegistry, DoorStyle};
use crate::config::{DesignConfig, DetectionConfig, DetectionSystem, ExtinguishingSystem};
use crate::gas::{
    ExtinctionSizing, GasQuantityService, GasRequest, GasRequestTask, GasResponse, GasUpdate,
    LocalGasCalculator,
};
use crate::geom::ray::Ray;
use crate::geom::segment::RouteSegment;
use crate::layout::{self, Layout, NozzleTarget, UseCase};
use crate::pick::{Committed, Hover, Picker, PlacementMode, SnapSettings};
use crate::report::ReportSummary;
use crate::room::{RoomModel, RoomSpec, Surface};
use crate::route::{DetectionNetwork, DistributionNetwork, route_detection, route_distribution};
use crate::Asset;
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything derived from a config and the placed assets.
struct Derived {
    room: RoomModel,
    layout: Layout,
    detection: DetectionNetwork,
    distribution: Option<DistributionNetwork>,
}

impl Derived {
    fn build(config: &DesignConfig, registry: &AssetRegistry, sizing: &ExtinctionSizing) -> Result<Self> {
        config.validate()?;
        let room = RoomModel::build(&config.room)?;
        let layout = layout::generate(&config.room, &config.use_case, Some(sizing.ig55_nozzles))?;
        let detection = detection_network(config, registry);
        let distribution = distribution_network(config, &layout, sizing);
        Ok(Self {
            room,
            layout,
            detection,
            distribution,
        })
    }
}

fn detection_network(config: &DesignConfig, registry: &AssetRegistry) -> DetectionNetwork {
    match config.detection.system {
        DetectionSystem::Aspirating => route_detection(&config.room, &config.detection.layers, registry),
        DetectionSystem::PointDetectors => DetectionNetwork::default(),
    }
}

fn distribution_network(
    config: &DesignConfig,
    layout: &Layout,
    sizing: &ExtinctionSizing,
) -> Option<DistributionNetwork> {
    let source = config.extinguishing.source(sizing)?;
    Some(route_distribution(&config.room, source, &layout.nozzles))
}

pub struct Design {
    config: DesignConfig,
    registry: AssetRegistry,
    picker: Picker,
    room: RoomModel,
    layout: Layout,
    detection: DetectionNetwork,
    distribution: Option<DistributionNetwork>,

    service: Arc<dyn GasQuantityService>,
    gas: Option<GasResponse>,
    /// Request of the current generation, kept for the local fallback
    pending: Option<GasRequest>,
    generation: u64,
    outbox: Sender<GasUpdate>,
    inbox: Receiver<GasUpdate>,
}

impl Design {
    /// Builds a design and sends the first quantity request to `service`.
    pub fn new(config: DesignConfig, service: Arc<dyn GasQuantityService>) -> Result<Self> {
        let registry = AssetRegistry::new();
        let sizing = LocalGasCalculator::sizing(config.room.area());
        let derived = Derived::build(&config, &registry, &sizing)?;
        let (outbox, inbox) = unbounded();

        let mut design = Self {
            picker: Picker::new(config.snapping),
            config,
            registry,
            room: derived.room,
            layout: derived.layout,
            detection: derived.detection,
            distribution: derived.distribution,
            service,
            gas: None,
            pending: None,
            generation: 0,
            outbox,
            inbox,
        };
        design.request_gas();
        Ok(design)
    }

    /// Design whose quantities are computed in-process.
    pub fn with_local_service(config: DesignConfig) -> Result<Self> {
        Self::new(config, Arc::new(LocalGasCalculator::new()))
    }

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    pub fn room(&self) -> &RoomModel {
        &self.room
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn detection(&self) -> &DetectionNetwork {
        &self.detection
    }

    pub fn distribution(&self) -> Option<&DistributionNetwork> {
        self.distribution.as_ref()
    }

    /// Last accepted quantity response.
    pub fn gas(&self) -> Option<&GasResponse> {
        self.gas.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cylinder and nozzle counts: from the last response, else computed locally.
    pub fn sizing(&self) -> ExtinctionSizing {
        let local = LocalGasCalculator::sizing(self.config.room.area());
        let Some(resp) = &self.gas else {
            return local;
        };
        // Fields the service left out come back as zero
        let or_local = |remote: u32, local: u32| if remote > 0 { remote } else { local };
        let remote = resp.extinction_system;
        ExtinctionSizing {
            ig55_cylinders: or_local(remote.ig55_cylinders, local.ig55_cylinders),
            ig55_nozzles: or_local(remote.ig55_nozzles, local.ig55_nozzles),
            hifog_tank_liters: or_local(remote.hifog_tank_liters, local.hifog_tank_liters),
        }
    }

    /// Rebuilds all derived state from the current config.
    pub fn rebuild(&mut self) -> Result<()> {
        let derived = Derived::build(&self.config, &self.registry, &self.sizing())?;
        self.install(derived);
        Ok(())
    }

    fn install(&mut self, derived: Derived) {
        self.room = derived.room;
        self.layout = derived.layout;
        self.detection = derived.detection;
        self.distribution = derived.distribution;
        info!(
            surfaces = self.room.surfaces().len(),
            nozzles = self.layout.nozzles.len(),
            conduits = self.detection.paths.len(),
            "design rebuilt"
        );
    }

    /// Replaces the whole config. Nothing changes if the new config is invalid.
    ///
    /// A new quantity request is sent when the room or the temperature changed.
    pub fn apply_config(&mut self, config: DesignConfig) -> Result<()> {
        let needs_gas = config.room != self.config.room || config.temperature != self.config.temperature;
        // Quantities of the old room are never applied to the new one
        let sizing = if needs_gas {
            LocalGasCalculator::sizing(config.room.area())
        } else {
            self.sizing()
        };

        let derived = Derived::build(&config, &self.registry, &sizing)?;
        self.picker = Picker::new(config.snapping);
        self.config = config;
        self.install(derived);

        if needs_gas {
            self.gas = None;
            self.request_gas();
        }
        Ok(())
    }

    pub fn set_room(&mut self, room: RoomSpec) -> Result<()> {
        let mut config = self.config.clone();
        config.room = room;
        self.apply_config(config)
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        let mut config = self.config.clone();
        config.temperature = temperature;
        self.apply_config(config)
    }

    pub fn set_use_case(&mut self, use_case: UseCase) -> Result<()> {
        let mut config = self.config.clone();
        config.use_case = use_case;
        self.apply_config(config)
    }

    pub fn set_detection(&mut self, detection: DetectionConfig) -> Result<()> {
        let mut config = self.config.clone();
        config.detection = detection;
        self.apply_config(config)
    }

    pub fn set_extinguishing(&mut self, extinguishing: ExtinguishingSystem) -> Result<()> {
        let mut config = self.config.clone();
        config.extinguishing = extinguishing;
        self.apply_config(config)
    }

    pub fn set_snapping(&mut self, snapping: SnapSettings) -> Result<()> {
        let mut config = self.config.clone();
        config.snapping = snapping;
        self.apply_config(config)
    }

    /// Sets the style used by [`Design::place_door`]. Doors already placed keep theirs.
    pub fn set_door_style(&mut self, style: DoorStyle) {
        self.config.door_style = style;
    }

    /// Resolves a pointer click and applies it to the registry.
    pub fn click(&mut self, ray: &Ray, mode: PlacementMode) -> Option<Committed> {
        let committed = self.picker.click(ray, mode, &self.room, &mut self.registry)?;
        self.refresh_detection();
        Some(committed)
    }

    /// Places a door in the configured style.
    pub fn place_door(&mut self, ray: &Ray) -> Option<Committed> {
        self.click(ray, PlacementMode::Door(self.config.door_style))
    }

    pub fn hover(&self, ray: &Ray, mode: PlacementMode) -> Option<Hover> {
        self.picker.hover(ray, mode, &self.room, &self.registry)
    }

    pub fn remove_by_name(&mut self, name: &str) -> Option<Asset> {
        let removed = self.registry.remove_by_name(name)?;
        info!(name, "removed asset");
        self.refresh_detection();
        Some(removed)
    }

    /// Removes every asset of `kind` and returns how many were removed.
    pub fn clear_kind(&mut self, kind: AssetKind) -> usize {
        let n = self.registry.clear_kind(kind);
        if n > 0 {
            info!(?kind, count = n, "cleared assets");
            self.refresh_detection();
        }
        n
    }

    /// Conduits depend on unit positions only, so nothing else is rebuilt.
    fn refresh_detection(&mut self) {
        self.detection = detection_network(&self.config, &self.registry);
    }

    fn refresh_extinguishing(&mut self) {
        let sizing = self.sizing();
        match layout::generate(&self.config.room, &self.config.use_case, Some(sizing.ig55_nozzles)) {
            Ok(layout) => {
                self.distribution = distribution_network(&self.config, &layout, &sizing);
                self.layout = layout;
            }
            Err(e) => warn!(error = %e, "layout rebuild failed, keeping previous layout"),
        }
    }

    /// Sends a quantity request for the current room, superseding any
    /// request still in flight. Returns its generation.
    pub fn request_gas(&mut self) -> u64 {
        self.generation += 1;
        let request = GasRequest::from_room(&self.config.room, self.config.temperature);
        self.pending = Some(request);
        GasRequestTask::spawn(self.service.clone(), request, self.generation, self.outbox.clone());
        debug!(generation = self.generation, "gas request sent");
        self.generation
    }

    /// Drains finished requests without blocking.
    ///
    /// Returns true if a response for the current generation was accepted.
    pub fn poll_gas(&mut self) -> bool {
        let mut accepted = false;
        while let Ok(update) = self.inbox.try_recv() {
            accepted |= self.accept(update);
        }
        if accepted {
            self.refresh_extinguishing();
        }
        accepted
    }

    /// Blocks until the current request is answered or `timeout` elapses.
    pub fn wait_for_gas(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(remaining) {
                Ok(update) => {
                    if self.accept(update) {
                        self.refresh_extinguishing();
                        return true;
                    }
                }
                Err(_) => return false,
            }
        }
    }

    fn accept(&mut self, update: GasUpdate) -> bool {
        if update.generation != self.generation {
            debug!(
                generation = update.generation,
                current = self.generation,
                "dropping stale gas response"
            );
            return false;
        }
        let response = match update.result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "gas service failed, using local quantities");
                let Some(request) = self.pending else {
                    return false;
                };
                match LocalGasCalculator::new().calculate(&request) {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!(error = %e, "local gas calculation failed");
                        return false;
                    }
                }
            }
        };
        info!(
            generation = update.generation,
            volume = response.volume_total,
            cylinders = response.extinction_system.ig55_cylinders,
            "gas quantities updated"
        );
        self.gas = Some(response);
        self.pending = None;
        true
    }

    pub fn surfaces(&self) -> &[Surface] {
        self.room.surfaces()
    }

    /// Placed assets ordered by kind, then index.
    pub fn assets(&self) -> Vec<&Asset> {
        AssetKind::ALL
            .iter()
            .flat_map(|&k| self.registry.list_by_kind(k))
            .collect()
    }

    /// Detection conduits followed by distribution pipes.
    pub fn route_segments(&self) -> Vec<RouteSegment> {
        let mut segs = self.detection.segments();
        if let Some(dist) = &self.distribution {
            segs.extend(dist.segments());
        }
        segs
    }

    /// Nozzles of the installed system; empty when nothing is installed.
    pub fn nozzles(&self) -> &[NozzleTarget] {
        match self.config.extinguishing {
            ExtinguishingSystem::None => &[],
            _ => &self.layout.nozzles,
        }
    }

    pub fn report(&self) -> ReportSummary {
        ReportSummary::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use crate::asset::AssetData;
    use crate::room::Layer;
    use anyhow::anyhow;

    /// Answers with a fixed delay, optionally failing.
    struct SlowService {
        delay: Duration,
        fail: bool,
    }

    impl GasQuantityService for SlowService {
        fn calculate(&self, request: &GasRequest) -> Result<GasResponse> {
            std::thread::sleep(self.delay);
            if self.fail {
                return Err(anyhow!("service unavailable"));
            }
            LocalGasCalculator::new().calculate(request)
        }
    }

    /// Reports a cylinder count tied to the request temperature.
    struct TaggedService {
        delay: Duration,
    }

    impl GasQuantityService for TaggedService {
        fn calculate(&self, request: &GasRequest) -> Result<GasResponse> {
            std::thread::sleep(self.delay);
            let mut resp = LocalGasCalculator::new().calculate(request)?;
            resp.extinction_system.ig55_cylinders = if request.temperature > 20.0 { 5 } else { 4 };
            Ok(resp)
        }
    }

    fn aspirating() -> DesignConfig {
        let mut config = DesignConfig::new();
        config.detection = DetectionConfig {
            system: DetectionSystem::Aspirating,
            layers: vec![Layer::Occupied],
        };
        config
    }

    #[test]
    fn test_rebuild_is_idempotent() -> Result<()> {
        let mut design = Design::with_local_service(aspirating())?;
        let before = design.route_segments();
        design.rebuild()?;
        design.rebuild()?;
        assert_eq!(design.route_segments(), before);
        assert_eq!(design.surfaces().len(), 5);
        Ok(())
    }

    #[test]
    fn test_invalid_room_keeps_previous_state() -> Result<()> {
        let mut design = Design::with_local_service(aspirating())?;
        let room = design.config().room;
        let lines = design.detection().lines.len();
        let generation = design.generation();

        assert!(design.set_room(RoomSpec::new(20.0, -1.0, 0.5, 3.0, 0.5)).is_err());
        assert_eq!(design.config().room, room);
        assert_eq!(design.room().spec(), &room);
        assert_eq!(design.detection().lines.len(), lines);
        assert_eq!(design.generation(), generation);
        Ok(())
    }

    #[test]
    fn test_unit_placement_refreshes_conduits() -> Result<()> {
        let mut design = Design::with_local_service(aspirating())?;
        assert!(design.detection().paths.is_empty());

        let ray = Ray::from_points(Point::new(0.0, 2.0, 0.0), Point::new(-10.0, 2.0, 0.0))
            .ok_or_else(|| anyhow!("bad ray"))?;
        let committed = design.click(&ray, PlacementMode::LineDetectionUnit);
        assert!(matches!(committed, Some(Committed::Placed(_))));
        // 2 lines, 2 ends each
        assert_eq!(design.detection().paths.len(), 4);

        assert!(design.remove_by_name("LDU 1").is_some());
        assert!(design.detection().paths.is_empty());
        Ok(())
    }

    #[test]
    fn test_stale_gas_response_is_ignored() -> Result<()> {
        let service = Arc::new(SlowService {
            delay: Duration::from_millis(50),
            fail: false,
        });
        let mut design = Design::new(DesignConfig::new(), service)?;
        // supersede the first request with a larger room
        design.set_room(RoomSpec::new(30.0, 10.0, 0.5, 3.0, 0.5))?;
        assert_eq!(design.generation(), 2);

        assert!(design.wait_for_gas(Duration::from_secs(5)));
        let gas = design.gas().ok_or_else(|| anyhow!("no gas response"))?;
        assert_eq!(gas.volume_total, 1200.0);
        assert_eq!(design.sizing().ig55_cylinders, 10);
        Ok(())
    }

    #[test]
    fn test_service_failure_falls_back_to_local() -> Result<()> {
        let service = Arc::new(SlowService {
            delay: Duration::from_millis(1),
            fail: true,
        });
        let mut config = DesignConfig::new();
        config.extinguishing = ExtinguishingSystem::InertGas;
        let mut design = Design::new(config, service)?;

        assert!(design.wait_for_gas(Duration::from_secs(5)));
        let gas = design.gas().ok_or_else(|| anyhow!("no gas response"))?;
        assert_eq!(gas.extinction_system.ig55_cylinders, 7);
        let dist = design.distribution().ok_or_else(|| anyhow!("no distribution"))?;
        assert_eq!(dist.vessels.len(), 7);
        Ok(())
    }

    #[test]
    fn test_nozzles_only_with_installed_system() -> Result<()> {
        let mut design = Design::with_local_service(DesignConfig::new())?;
        assert!(design.nozzles().is_empty());
        assert!(design.distribution().is_none());

        design.set_extinguishing(ExtinguishingSystem::WaterMist)?;
        assert_eq!(design.nozzles().len(), 3);
        let dist = design.distribution().ok_or_else(|| anyhow!("no distribution"))?;
        assert_eq!(dist.branches.len(), 3);
        Ok(())
    }

    #[test]
    fn test_poll_gas_applies_current_generation_only() -> Result<()> {
        let delay = Duration::from_millis(200);
        let mut config = DesignConfig::new();
        config.extinguishing = ExtinguishingSystem::InertGas;
        let mut design = Design::new(config, Arc::new(TaggedService { delay }))?;
        design.set_temperature(30.0)?;
        assert_eq!(design.generation(), 2);

        // Nothing has arrived yet
        let start = Instant::now();
        assert!(!design.poll_gas());
        assert!(start.elapsed() < delay);
        assert!(design.gas().is_none());
        let vessels = |d: &Design| d.distribution().map(|n| n.vessels.len());
        assert_eq!(vessels(&design), Some(7));

        let deadline = Instant::now() + Duration::from_secs(5);
        while !design.poll_gas() {
            assert!(Instant::now() < deadline, "no gas response");
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(design.sizing().ig55_cylinders, 5);
        assert_eq!(vessels(&design), Some(5));

        // The response to the superseded request never replaces the current one
        std::thread::sleep(2 * delay);
        assert!(!design.poll_gas());
        assert_eq!(vessels(&design), Some(5));
        Ok(())
    }

    #[test]
    fn test_place_door_uses_configured_style() -> Result<()> {
        let mut config = DesignConfig::new();
        config.door_style = DoorStyle::Double;
        let mut design = Design::with_local_service(config)?;

        let ray = Ray::from_points(Point::new(2.0, 1.5, 0.0), Point::new(2.0, 1.5, 10.0))
            .ok_or_else(|| anyhow!("bad ray"))?;
        let Some(Committed::Placed(door)) = design.place_door(&ray) else {
            return Err(anyhow!("door not placed"));
        };
        assert_eq!(door.data, AssetData::Door { style: DoorStyle::Double });
        let frame = &door.parts()[0];
        assert!((frame.bbox.max.x - frame.bbox.min.x - 1.8).abs() < 1e-9);

        design.set_door_style(DoorStyle::Single);
        let ray = Ray::from_points(Point::new(-2.0, 1.5, 0.0), Point::new(-2.0, 1.5, 10.0))
            .ok_or_else(|| anyhow!("bad ray"))?;
        let Some(Committed::Placed(door)) = design.place_door(&ray) else {
            return Err(anyhow!("door not placed"));
        };
        assert_eq!(door.data, AssetData::Door { style: DoorStyle::Single });
        Ok(())
    }
}
