//! Parametric three-layer room.
//!
//! A room is a `length × width` footprint centered on the origin, stacked
//! from `y = 0` upwards as raised floor, occupied volume and suspended
//! ceiling. [`RoomModel`] derives the collidable surfaces used for picking:
//! four walls spanning the occupied band and the occupied-volume floor.

use crate::geom::bboxes::BoundingBox;
use crate::geom::plane::Plane;
use crate::geom::ray::Ray;
use crate::{HasName, Point, Vector};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Tolerance for in-rectangle tests of surface hits.
const SURFACE_TOL: f64 = 1e-6;

/// One of the three horizontal layers of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    RaisedFloor,
    Occupied,
    Ceiling,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::RaisedFloor, Layer::Occupied, Layer::Ceiling];

    pub fn label(&self) -> &'static str {
        match self {
            Layer::RaisedFloor => "raised floor",
            Layer::Occupied => "occupied",
            Layer::Ceiling => "ceiling",
        }
    }
}

/// Vertical extent of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBand {
    pub layer: Layer,
    pub y_min: f64,
    pub y_max: f64,
}

impl LayerBand {
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, y: f64) -> bool {
        y >= self.y_min && y <= self.y_max
    }
}

/// Room dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub length: f64,
    pub width: f64,
    /// Raised-floor height
    pub height_fp: f64,
    /// Occupied-volume height
    pub height_amb: f64,
    /// Suspended-ceiling height
    pub height_fc: f64,
}

impl Default for RoomSpec {
    fn default() -> Self {
        Self::new(20.0, 10.0, 0.5, 3.0, 0.5)
    }
}

impl RoomSpec {
    pub fn new(length: f64, width: f64, height_fp: f64, height_amb: f64, height_fc: f64) -> Self {
        Self {
            length,
            width,
            height_fp,
            height_amb,
            height_fc,
        }
    }

    /// Fails if any dimension is not a finite positive number.
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("length", self.length),
            ("width", self.width),
            ("height_fp", self.height_fp),
            ("height_amb", self.height_amb),
            ("height_fc", self.height_fc),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                bail!("Room dimension '{}' must be a positive number, got {}", name, value);
            }
        }
        Ok(())
    }

    pub fn total_height(&self) -> f64 {
        self.height_fp + self.height_amb + self.height_fc
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    pub fn volume(&self) -> f64 {
        self.area() * self.total_height()
    }

    /// Top of the raised floor, i.e. the walking surface.
    pub fn floor_y(&self) -> f64 {
        self.height_fp
    }

    /// Top of the occupied volume, i.e. the underside of the suspended ceiling.
    pub fn ceiling_y(&self) -> f64 {
        self.height_fp + self.height_amb
    }

    pub fn band(&self, layer: Layer) -> LayerBand {
        let (y_min, y_max) = match layer {
            Layer::RaisedFloor => (0.0, self.height_fp),
            Layer::Occupied => (self.height_fp, self.ceiling_y()),
            Layer::Ceiling => (self.ceiling_y(), self.total_height()),
        };
        LayerBand { layer, y_min, y_max }
    }

    pub fn bands(&self) -> [LayerBand; 3] {
        Layer::ALL.map(|l| self.band(l))
    }

    /// True if `(x, z)` lies strictly inside the footprint.
    pub fn contains_footprint(&self, x: f64, z: f64) -> bool {
        x.abs() < self.length / 2.0 && z.abs() < self.width / 2.0
    }
}

/// Axis of a wall's normal.
///
/// `X` walls stand at `x = ±length/2`, `Z` walls at `z = ±width/2`.
/// The in-plane horizontal coordinate of an `X` wall is Z and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallAxis {
    X,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Wall(WallAxis),
    Floor,
}

/// Planar axis-aligned collidable rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub name: String,
    pub kind: SurfaceKind,
    /// Unit normal pointing away from the surface into the room
    pub normal: Vector,
    /// Extent of the rectangle (flat along the normal axis)
    pub bounds: BoundingBox,
}

impl HasName for Surface {
    fn get_name(&self) -> &str {
        &self.name
    }
}

impl Surface {
    pub fn is_floor(&self) -> bool {
        self.kind == SurfaceKind::Floor
    }

    pub fn wall_axis(&self) -> Option<WallAxis> {
        match self.kind {
            SurfaceKind::Wall(axis) => Some(axis),
            SurfaceKind::Floor => None,
        }
    }

    /// Normal of a wall. The floor carries no wall normal.
    pub fn wall_normal(&self) -> Option<Vector> {
        self.wall_axis().map(|_| self.normal)
    }

    pub fn plane(&self) -> Plane {
        let c = self.bounds.center();
        let n = self.normal;
        Plane {
            normal: n,
            d: -(n.dx * c.x + n.dy * c.y + n.dz * c.z),
        }
    }

    /// Intersects a ray with the room-facing side of this surface.
    ///
    /// Surfaces are one-sided: a ray arriving from behind (outside the room)
    /// passes through, so near walls never hide the far side of the room.
    pub fn intersect(&self, ray: &Ray) -> Option<(f64, Point)> {
        if self.normal.dot(&ray.direction) >= 0.0 {
            return None;
        }
        let (t, pt) = ray.intersect_plane(&self.plane())?;
        if self.bounds.contains(pt, SURFACE_TOL) {
            Some((t, pt))
        } else {
            None
        }
    }
}

/// A ray hit on a room surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit<'a> {
    pub t: f64,
    pub point: Point,
    pub surface: &'a Surface,
}

/// Collidable surfaces and layer bands derived from a [`RoomSpec`].
#[derive(Debug, Clone)]
pub struct RoomModel {
    spec: RoomSpec,
    surfaces: Vec<Surface>,
}

impl RoomModel {
    /// Derives walls and floor from the room dimensions.
    pub fn build(spec: &RoomSpec) -> Result<Self> {
        spec.validate()?;

        let hl = spec.length / 2.0;
        let hw = spec.width / 2.0;
        let y0 = spec.floor_y();
        let y1 = spec.ceiling_y();

        let wall = |name: &str, axis: WallAxis, normal: Vector, a: Point, b: Point| Surface {
            name: name.to_string(),
            kind: SurfaceKind::Wall(axis),
            normal,
            bounds: BoundingBox::new(a, b),
        };

        let surfaces = vec![
            wall(
                "wall_z_pos",
                WallAxis::Z,
                Vector::new(0.0, 0.0, -1.0),
                Point::new(-hl, y0, hw),
                Point::new(hl, y1, hw),
            ),
            wall(
                "wall_z_neg",
                WallAxis::Z,
                Vector::new(0.0, 0.0, 1.0),
                Point::new(-hl, y0, -hw),
                Point::new(hl, y1, -hw),
            ),
            wall(
                "wall_x_neg",
                WallAxis::X,
                Vector::new(1.0, 0.0, 0.0),
                Point::new(-hl, y0, -hw),
                Point::new(-hl, y1, hw),
            ),
            wall(
                "wall_x_pos",
                WallAxis::X,
                Vector::new(-1.0, 0.0, 0.0),
                Point::new(hl, y0, -hw),
                Point::new(hl, y1, hw),
            ),
            Surface {
                name: "floor".to_string(),
                kind: SurfaceKind::Floor,
                normal: Vector::new(0.0, 1.0, 0.0),
                bounds: BoundingBox::new(Point::new(-hl, y0, -hw), Point::new(hl, y0, hw)),
            },
        ];

        Ok(Self {
            spec: *spec,
            surfaces,
        })
    }

    pub fn spec(&self) -> &RoomSpec {
        &self.spec
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn walls(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(|s| !s.is_floor())
    }

    pub fn floor(&self) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.is_floor())
    }

    pub fn bands(&self) -> [LayerBand; 3] {
        self.spec.bands()
    }

    /// Returns the nearest hit among surfaces accepted by `filter`.
    pub fn intersect<F>(&self, ray: &Ray, filter: F) -> Option<SurfaceHit<'_>>
    where
        F: Fn(&Surface) -> bool,
    {
        let mut closest: Option<SurfaceHit> = None;
        for surface in self.surfaces.iter().filter(|s| filter(s)) {
            if let Some((t, point)) = surface.intersect(ray) {
                match &closest {
                    Some(hit) if hit.t <= t => {}
                    _ => closest = Some(SurfaceHit { t, point, surface }),
                }
            }
        }
        closest
    }
}
