//! Pointer picking and grid snapping.
//!
//! A pointer ray is turned into a placement candidate for the active
//! [`PlacementMode`]. Point detectors land on a horizontal plane at their
//! layer height, wall-mounted assets on the room surfaces, and delete mode
//! hits the geometry of already placed assets.

use crate::asset::{
    AssetData, AssetKind, AssetRegistry, DETECTOR_HEIGHT, DOOR_HEIGHT, DoorStyle, Placement,
    UNIT_DEPTH, VENT_DEPTH,
};
use crate::geom::plane::Plane;
use crate::geom::ray::Ray;
use crate::geom::snap_to_grid;
use crate::room::{Layer, RoomModel, RoomSpec, Surface, SurfaceKind, WallAxis};
use crate::{Asset, HasName, Point, UID, Vector};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, info};

/// Height of the raised-floor detector plane.
pub const RAISED_FLOOR_DETECTOR_Y: f64 = 0.05;

/// Pinhole camera used to turn a pointer position into a ray.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub eye: Point,
    pub target: Point,
    pub up: Vector,
    /// Vertical field of view in radians
    pub fov_y: f64,
    /// Viewport width / height
    pub aspect: f64,
}

impl View {
    pub fn new(eye: Point, target: Point, fov_y: f64, aspect: f64) -> Self {
        Self {
            eye,
            target,
            up: Vector::new(0.0, 1.0, 0.0),
            fov_y,
            aspect,
        }
    }

    /// Ray through a pointer position in normalized device coordinates
    /// (`-1..1` on both axes, `+y` up).
    pub fn ray_through(&self, ndc_x: f64, ndc_y: f64) -> Option<Ray> {
        let forward = (self.target - self.eye).normalize().ok()?;
        let right = forward.cross(&self.up).normalize().ok()?;
        let up = right.cross(&forward);
        let h = (self.fov_y / 2.0).tan();
        let dir = forward + right * (ndc_x * h * self.aspect) + up * (ndc_y * h);
        Ray::new(self.eye, dir)
    }
}

/// Snapping toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Snap point detectors in X and Z
    pub point_detectors: bool,
    /// Snap wall/floor mounted assets (line-detection units, vents)
    pub wall_assets: bool,
    /// Doors dropped on the floor turn by 90 degrees
    pub door_angle: bool,
    pub step: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            point_detectors: true,
            wall_assets: true,
            door_angle: false,
            step: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementMode {
    PointDetector(Layer),
    LineDetectionUnit,
    Vent,
    Door(DoorStyle),
    Delete,
}

/// A snapped placement ready to be committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub data: AssetData,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickResult {
    Place(Candidate),
    Delete(UID),
}

/// Cursor readout while hovering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    pub position: Point,
    /// Distance to the most recently placed point detector
    pub distance_to_last: Option<f64>,
}

/// Registry change made by [`Picker::commit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    Placed(Asset),
    Removed(Asset),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Picker {
    pub snap: SnapSettings,
}

impl Picker {
    pub fn new(snap: SnapSettings) -> Self {
        Self { snap }
    }

    /// Y of the horizontal plane point detectors are placed on.
    pub fn detector_plane_y(spec: &RoomSpec, layer: Layer) -> f64 {
        match layer {
            Layer::RaisedFloor => RAISED_FLOOR_DETECTOR_Y,
            Layer::Occupied => spec.ceiling_y(),
            Layer::Ceiling => spec.total_height(),
        }
    }

    /// Snaps X and Z of a point-detector candidate; Y is left alone.
    pub fn snap_horizontal(&self, p: Point) -> Point {
        if !self.snap.point_detectors {
            return p;
        }
        let step = self.snap.step;
        Point::new(snap_to_grid(p.x, step), p.y, snap_to_grid(p.z, step))
    }

    /// Snaps a surface hit to the grid, keeping the surface's normal axis pinned.
    pub fn snap_on_surface(&self, p: Point, surface: &Surface) -> Point {
        if !self.snap.wall_assets {
            return p;
        }
        let step = self.snap.step;
        match surface.kind {
            SurfaceKind::Wall(WallAxis::Z) => {
                Point::new(snap_to_grid(p.x, step), snap_to_grid(p.y, step), p.z)
            }
            SurfaceKind::Wall(WallAxis::X) => {
                Point::new(p.x, snap_to_grid(p.y, step), snap_to_grid(p.z, step))
            }
            SurfaceKind::Floor => Point::new(snap_to_grid(p.x, step), p.y, snap_to_grid(p.z, step)),
        }
    }

    /// Resolves a pointer ray. `None` means the ray hit nothing relevant.
    pub fn pick(
        &self,
        ray: &Ray,
        mode: PlacementMode,
        room: &RoomModel,
        registry: &AssetRegistry,
    ) -> Option<PickResult> {
        match mode {
            PlacementMode::PointDetector(layer) => {
                let spec = room.spec();
                let s = self.detector_target(ray, spec, layer)?;
                if !spec.contains_footprint(s.x, s.z) {
                    return None;
                }
                // Detectors under a ceiling hang below the plane
                let position = match layer {
                    Layer::RaisedFloor => s,
                    _ => s.with_y(s.y - DETECTOR_HEIGHT / 2.0),
                };
                Some(PickResult::Place(Candidate {
                    data: AssetData::PointDetector { layer },
                    placement: Placement::new(position, 0.0),
                }))
            }
            PlacementMode::LineDetectionUnit => {
                let hit = room.intersect(ray, |s| !s.is_floor())?;
                let s = self.snap_on_surface(hit.point, hit.surface);
                let normal = hit.surface.normal;
                Some(PickResult::Place(Candidate {
                    data: AssetData::LineDetectionUnit,
                    placement: Placement::facing(s + normal * (UNIT_DEPTH / 2.0), normal),
                }))
            }
            PlacementMode::Vent => {
                let hit = room.intersect(ray, |_| true)?;
                let s = self.snap_on_surface(hit.point, hit.surface);
                let normal = hit.surface.normal;
                Some(PickResult::Place(Candidate {
                    data: AssetData::Vent,
                    placement: Placement::facing(s + normal * (VENT_DEPTH / 2.0), normal),
                }))
            }
            PlacementMode::Door(style) => {
                let hit = room.intersect(ray, |_| true)?;
                let position = hit
                    .point
                    .with_y(room.spec().floor_y() + DOOR_HEIGHT / 2.0);
                let yaw = self.door_yaw(hit.surface);
                Some(PickResult::Place(Candidate {
                    data: AssetData::Door { style },
                    placement: Placement::new(position, yaw),
                }))
            }
            PlacementMode::Delete => self.pick_asset(ray, registry).map(PickResult::Delete),
        }
    }

    /// Cursor position for the active mode, without committing anything.
    pub fn hover(
        &self,
        ray: &Ray,
        mode: PlacementMode,
        room: &RoomModel,
        registry: &AssetRegistry,
    ) -> Option<Hover> {
        match mode {
            PlacementMode::PointDetector(layer) => {
                let s = self.detector_target(ray, room.spec(), layer)?;
                let distance_to_last = registry
                    .last_of_kind(AssetKind::PointDetector)
                    .map(|a| s.distance(&a.position()));
                Some(Hover {
                    position: s,
                    distance_to_last,
                })
            }
            PlacementMode::LineDetectionUnit | PlacementMode::Vent => {
                let hit = room.intersect(ray, |_| true)?;
                Some(Hover {
                    position: self.snap_on_surface(hit.point, hit.surface),
                    distance_to_last: None,
                })
            }
            PlacementMode::Door(_) => match self.pick(ray, mode, room, registry)? {
                PickResult::Place(c) => Some(Hover {
                    position: c.placement.position,
                    distance_to_last: None,
                }),
                PickResult::Delete(_) => None,
            },
            PlacementMode::Delete => None,
        }
    }

    /// Applies a pick result to the registry.
    pub fn commit(&self, result: PickResult, registry: &mut AssetRegistry) -> Option<Committed> {
        match result {
            PickResult::Place(c) => {
                let asset = registry.create(c.data, c.placement).clone();
                info!(name = asset.get_name(), position = %asset.position(), "placed asset");
                Some(Committed::Placed(asset))
            }
            PickResult::Delete(uid) => {
                let asset = registry.remove(&uid)?;
                info!(name = asset.get_name(), "removed asset");
                Some(Committed::Removed(asset))
            }
        }
    }

    /// Picks and commits in one step.
    pub fn click(
        &self,
        ray: &Ray,
        mode: PlacementMode,
        room: &RoomModel,
        registry: &mut AssetRegistry,
    ) -> Option<Committed> {
        match self.pick(ray, mode, room, registry) {
            Some(result) => self.commit(result, registry),
            None => {
                debug!(?mode, "pointer ray hit nothing");
                None
            }
        }
    }

    fn detector_target(&self, ray: &Ray, spec: &RoomSpec, layer: Layer) -> Option<Point> {
        let plane = Plane::horizontal(Self::detector_plane_y(spec, layer));
        let (_, p) = ray.intersect_plane(&plane)?;
        Some(self.snap_horizontal(p))
    }

    fn door_yaw(&self, surface: &Surface) -> f64 {
        match surface.wall_normal() {
            Some(n) if n.dx.abs() > 0.5 => FRAC_PI_2,
            Some(_) => 0.0,
            None if self.snap.door_angle => FRAC_PI_2,
            None => 0.0,
        }
    }

    /// Nearest asset whose geometry the ray hits, resolved to the owning asset.
    fn pick_asset(&self, ray: &Ray, registry: &AssetRegistry) -> Option<UID> {
        let mut closest: Option<(f64, UID)> = None;
        for part in registry.parts() {
            if let Some((t, _)) = ray.intersect_box(&part.bbox) {
                match &closest {
                    Some((best, _)) if *best <= t => {}
                    _ => closest = Some((t, part.parent)),
                }
            }
        }
        let (_, uid) = closest?;
        registry.get(&uid).map(|a| a.uid)
    }
}
