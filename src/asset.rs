//! Placed point assets and their registry.
//!
//! Assets are numbered per kind (`"LDU 1"`, `"LDU 2"`, `"Door 1"`, ...).
//! Numbers are dense: deleting `"LDU 2"` frees index 2 for the next unit.

use crate::geom::bboxes::BoundingBox;
use crate::room::Layer;
use crate::{HasIndex, HasName, Point, SortByIndex, UID, Vector};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Line-detection unit enclosure (width × height × depth).
pub const UNIT_WIDTH: f64 = 0.3;
pub const UNIT_HEIGHT: f64 = 0.4;
pub const UNIT_DEPTH: f64 = 0.15;
/// Conduit inlet height above the unit center.
pub const UNIT_INLET_OFFSET: f64 = 0.2;

/// Point detector body (cylinder radius and height).
pub const DETECTOR_RADIUS: f64 = 0.1;
pub const DETECTOR_HEIGHT: f64 = 0.05;

pub const DOOR_HEIGHT: f64 = 2.1;
pub const DOOR_THICKNESS: f64 = 0.1;

/// Vent grille (width × height × depth).
pub const VENT_WIDTH: f64 = 0.5;
pub const VENT_HEIGHT: f64 = 0.3;
pub const VENT_DEPTH: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    LineDetectionUnit,
    PointDetector,
    Door,
    Vent,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::LineDetectionUnit,
        AssetKind::PointDetector,
        AssetKind::Door,
        AssetKind::Vent,
    ];

    /// Display-name prefix; the name is `prefix + index`.
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetKind::LineDetectionUnit => "LDU ",
            AssetKind::PointDetector => "PD",
            AssetKind::Door => "Door ",
            AssetKind::Vent => "Vent ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorStyle {
    #[default]
    Single,
    Double,
}

impl DoorStyle {
    pub fn width(&self) -> f64 {
        match self {
            DoorStyle::Single => 0.9,
            DoorStyle::Double => 1.8,
        }
    }
}

/// Kind-specific asset payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetData {
    LineDetectionUnit,
    PointDetector { layer: Layer },
    Door { style: DoorStyle },
    Vent,
}

impl AssetData {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetData::LineDetectionUnit => AssetKind::LineDetectionUnit,
            AssetData::PointDetector { .. } => AssetKind::PointDetector,
            AssetData::Door { .. } => AssetKind::Door,
            AssetData::Vent => AssetKind::Vent,
        }
    }
}

/// Position and heading of an asset. `yaw` rotates the asset's local +Z
/// (its front) about the world Y axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Point,
    pub yaw: f64,
}

impl Placement {
    pub fn new(position: Point, yaw: f64) -> Self {
        Self { position, yaw }
    }

    /// Placement whose front faces along the horizontal part of `normal`.
    pub fn facing(position: Point, normal: Vector) -> Self {
        let yaw = if normal.dx.abs() < 1e-12 && normal.dz.abs() < 1e-12 {
            0.0
        } else {
            normal.dx.atan2(normal.dz)
        };
        Self { position, yaw }
    }

    /// Transforms a local offset into world space.
    fn to_world(&self, local: Vector) -> Point {
        let (s, c) = self.yaw.sin_cos();
        self.position + Vector::new(local.dx * c + local.dz * s, local.dy, -local.dx * s + local.dz * c)
    }

    /// World-aligned box enclosing a local box of size `(w, h, d)` centered at `local`.
    fn world_box(&self, local: Vector, w: f64, h: f64, d: f64) -> BoundingBox {
        let (s, c) = self.yaw.sin_cos();
        let (s, c) = (s.abs(), c.abs());
        let sx = c * w + s * d;
        let sz = s * w + c * d;
        BoundingBox::from_center_size(self.to_world(local), sx, h, sz)
    }
}

/// One hit-testable piece of an asset's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPart {
    pub name: &'static str,
    pub bbox: BoundingBox,
    /// Asset this part belongs to
    pub parent: UID,
}

/// A placed asset. Never edited in place: edits replace the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub uid: UID,
    pub index: u32,
    pub data: AssetData,
    pub placement: Placement,
    name: String,
}

impl HasName for Asset {
    fn get_name(&self) -> &str {
        &self.name
    }
}

impl HasIndex for Asset {
    fn get_index(&self) -> u32 {
        self.index
    }
}

impl Asset {
    pub fn new(index: u32, data: AssetData, placement: Placement) -> Self {
        let name = format!("{}{}", data.kind().prefix(), index);
        Self {
            uid: UID::new(),
            index,
            data,
            placement,
            name,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.data.kind()
    }

    pub fn position(&self) -> Point {
        self.placement.position
    }

    /// Returns a copy at a new placement, keeping identity and name.
    pub fn with_placement(&self, placement: Placement) -> Self {
        Self {
            placement,
            ..self.clone()
        }
    }

    /// Hit-test boxes of the asset geometry, each tagged with this asset as parent.
    pub fn parts(&self) -> Vec<AssetPart> {
        let pl = &self.placement;
        let part = |name: &'static str, bbox: BoundingBox| AssetPart {
            name,
            bbox,
            parent: self.uid,
        };
        let zero = Vector::new(0.0, 0.0, 0.0);

        match self.data {
            AssetData::LineDetectionUnit => {
                vec![part("enclosure", pl.world_box(zero, UNIT_WIDTH, UNIT_HEIGHT, UNIT_DEPTH))]
            }
            AssetData::PointDetector { .. } => {
                let d = 2.0 * DETECTOR_RADIUS;
                vec![
                    part("body", pl.world_box(zero, d, DETECTOR_HEIGHT, d)),
                    part("led", pl.world_box(Vector::new(0.0, -0.03, 0.0), 0.04, 0.04, 0.04)),
                ]
            }
            AssetData::Door { style } => {
                let w = style.width();
                let sign_y = DOOR_HEIGHT / 2.0 + 0.15;
                vec![
                    part("frame", pl.world_box(zero, w, DOOR_HEIGHT, DOOR_THICKNESS)),
                    part("sign_ext", pl.world_box(Vector::new(0.0, sign_y, 0.06), 0.4, 0.15, 0.05)),
                    part("sign_int", pl.world_box(Vector::new(0.0, sign_y, -0.06), 0.4, 0.15, 0.05)),
                ]
            }
            AssetData::Vent => {
                vec![part("grille", pl.world_box(zero, VENT_WIDTH, VENT_HEIGHT, VENT_DEPTH))]
            }
        }
    }
}

/// Ordered collection of placed assets.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the smallest positive index not used by any asset of `kind`.
    pub fn allocate_index(&self, kind: AssetKind) -> u32 {
        let mut used: Vec<u32> = self
            .assets
            .iter()
            .filter(|a| a.kind() == kind)
            .map(|a| a.index)
            .collect();
        used.sort_unstable();

        let mut next = 1;
        for idx in used {
            if idx != next {
                return next;
            }
            next += 1;
        }
        next
    }

    /// Adds an asset. Its index must be free within its kind.
    pub fn insert(&mut self, asset: Asset) -> Result<()> {
        if asset.index == 0 {
            bail!("Asset index must be positive: {}", asset.get_name());
        }
        if self
            .assets
            .iter()
            .any(|a| a.uid == asset.uid || (a.kind() == asset.kind() && a.index == asset.index))
        {
            bail!("Asset is already present: {}", asset.get_name());
        }
        self.assets.push(asset);
        Ok(())
    }

    /// Allocates an index, creates the asset and inserts it.
    pub fn create(&mut self, data: AssetData, placement: Placement) -> &Asset {
        let index = self.allocate_index(data.kind());
        self.assets.push(Asset::new(index, data, placement));
        &self.assets[self.assets.len() - 1]
    }

    /// Swaps in an edited asset with the same `uid`.
    pub fn replace(&mut self, asset: Asset) -> Result<Asset> {
        match self.assets.iter_mut().find(|a| a.uid == asset.uid) {
            Some(slot) if slot.kind() == asset.kind() && slot.index == asset.index => {
                Ok(std::mem::replace(slot, asset))
            }
            Some(_) => bail!("Cannot change kind or index of {}", asset.get_name()),
            None => bail!("Asset not found: {}", asset.get_name()),
        }
    }

    pub fn remove(&mut self, uid: &UID) -> Option<Asset> {
        let pos = self.assets.iter().position(|a| a.uid == *uid)?;
        Some(self.assets.remove(pos))
    }

    pub fn remove_by_name(&mut self, name: &str) -> Option<Asset> {
        let uid = self.find_by_name(name)?.uid;
        self.remove(&uid)
    }

    /// Removes every asset of `kind`, returning how many were removed.
    pub fn clear_kind(&mut self, kind: AssetKind) -> usize {
        let before = self.assets.len();
        self.assets.retain(|a| a.kind() != kind);
        before - self.assets.len()
    }

    pub fn get(&self, uid: &UID) -> Option<&Asset> {
        self.assets.iter().find(|a| a.uid == *uid)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.get_name() == name)
    }

    /// Assets of `kind` ordered by index.
    pub fn list_by_kind(&self, kind: AssetKind) -> Vec<&Asset> {
        let mut list: Vec<&Asset> = self.assets.iter().filter(|a| a.kind() == kind).collect();
        list.as_mut_slice().sort_by_index();
        list
    }

    /// Most recently inserted asset of `kind`.
    pub fn last_of_kind(&self, kind: AssetKind) -> Option<&Asset> {
        self.assets.iter().rev().find(|a| a.kind() == kind)
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        self.assets.iter().filter(|a| a.kind() == kind).count()
    }

    /// Assets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Hit-test parts of every asset.
    pub fn parts(&self) -> Vec<AssetPart> {
        self.assets.iter().flat_map(|a| a.parts()).collect()
    }
}
