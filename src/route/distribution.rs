//! Extinguishing-agent distribution: source, feed and nozzle fan-out.
//!
//! Inert gas is stored in a bank of cylinders in one room corner; water mist
//! comes from a tank standing outside the `+X` wall. Either source feeds an
//! entry point at nozzle height, from which a spine runs along Z and a branch
//! goes to every nozzle.

use crate::Point;
use crate::geom::segment::{RouteSegment, push_segment, total_length};
use crate::layout::NozzleTarget;
use crate::room::RoomSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CYLINDERS_PER_ROW: u32 = 10;
pub const CYLINDER_PITCH: f64 = 0.3;
pub const CYLINDER_HEIGHT: f64 = 1.6;
pub const CYLINDER_RADIUS: f64 = 0.12;
pub const TANK_HEIGHT: f64 = 3.0;
pub const TANK_RADIUS: f64 = 1.5;
/// Nozzle plane height above the floor when there are no nozzles.
pub const FALLBACK_PLANE_OFFSET: f64 = 3.0;

const DROP_RADIUS: f64 = 0.01;
const MANIFOLD_RADIUS: f64 = 0.03;
const RISER_RADIUS: f64 = 0.04;
const FEED_RADIUS: f64 = 0.05;
const SPINE_RADIUS: f64 = 0.04;
const BRANCH_RADIUS: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentSource {
    CylinderBank { count: u32 },
    Tank,
}

/// Upright cylinder standing on `base`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub base: Point,
    pub height: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spine {
    pub x: f64,
    pub y: f64,
    pub z_min: f64,
    pub z_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionNetwork {
    pub source: AgentSource,
    /// Cylinders of the bank, or the single tank.
    pub vessels: Vec<Vessel>,
    /// Pipes from the source up to `entry`.
    pub feed: Vec<RouteSegment>,
    pub entry: Point,
    pub spine: Option<Spine>,
    pub spine_segments: Vec<RouteSegment>,
    pub branches: Vec<RouteSegment>,
}

impl DistributionNetwork {
    pub fn segments(&self) -> Vec<RouteSegment> {
        self.feed
            .iter()
            .chain(&self.spine_segments)
            .chain(&self.branches)
            .copied()
            .collect()
    }

    pub fn pipe_length(&self) -> f64 {
        total_length(&self.segments())
    }
}

/// Y of the nozzle plane: the first nozzle's height, or a fixed offset above the floor.
pub fn plane_height(spec: &RoomSpec, nozzles: &[NozzleTarget]) -> f64 {
    nozzles
        .first()
        .map(|n| n.position.y)
        .unwrap_or(spec.floor_y() + FALLBACK_PLANE_OFFSET)
}

/// Builds the whole distribution network for `source`.
pub fn route_distribution(spec: &RoomSpec, source: AgentSource, nozzles: &[NozzleTarget]) -> DistributionNetwork {
    let plane_y = plane_height(spec, nozzles);
    let (vessels, feed, entry) = match source {
        AgentSource::CylinderBank { count } => cylinder_bank(spec, count, plane_y),
        AgentSource::Tank => tank(spec, plane_y),
    };
    let (spine, spine_segments, branches) = fan_out(entry, nozzles);

    debug!(
        ?source,
        nozzles = nozzles.len(),
        branches = branches.len(),
        "rebuilt distribution network"
    );

    DistributionNetwork {
        source,
        vessels,
        feed,
        entry,
        spine,
        spine_segments,
        branches,
    }
}

/// Cylinders in rows of [`CYLINDERS_PER_ROW`] from the `(-X, -Z)` corner.
///
/// Each cylinder drops into a manifold running along X, and a riser from the
/// manifold midpoint climbs to the nozzle plane. At least one cylinder is laid out.
fn cylinder_bank(spec: &RoomSpec, count: u32, plane_y: f64) -> (Vec<Vessel>, Vec<RouteSegment>, Point) {
    let count = count.max(1);
    let floor = spec.floor_y();
    let start = Point::new(-spec.length / 2.0 + 1.0, floor, -spec.width / 2.0 + 1.0);
    let valve_y = floor + CYLINDER_HEIGHT + 0.1;
    let manifold_y = floor + CYLINDER_HEIGHT + 0.2;

    let mut vessels = Vec::with_capacity(count as usize);
    let mut feed = Vec::new();
    for i in 0..count {
        let row = i / CYLINDERS_PER_ROW;
        let col = i % CYLINDERS_PER_ROW;
        let x = start.x + col as f64 * CYLINDER_PITCH;
        let z = start.z + row as f64 * CYLINDER_PITCH;
        vessels.push(Vessel {
            base: Point::new(x, floor, z),
            height: CYLINDER_HEIGHT,
            radius: CYLINDER_RADIUS,
        });
        push_segment(
            &mut feed,
            Point::new(x, valve_y, z),
            Point::new(x, manifold_y, z),
            DROP_RADIUS,
        );
    }

    let bank_len = count.min(CYLINDERS_PER_ROW) as f64 * CYLINDER_PITCH;
    push_segment(
        &mut feed,
        Point::new(start.x, manifold_y, start.z),
        Point::new(start.x + bank_len, manifold_y, start.z),
        MANIFOLD_RADIUS,
    );

    let riser_x = start.x + bank_len / 2.0;
    let entry = Point::new(riser_x, plane_y, start.z);
    push_segment(
        &mut feed,
        Point::new(riser_x, manifold_y, start.z),
        entry,
        RISER_RADIUS,
    );

    (vessels, feed, entry)
}

/// Tank outside the `+X` wall, fed in at the wall at nozzle height.
fn tank(spec: &RoomSpec, plane_y: f64) -> (Vec<Vessel>, Vec<RouteSegment>, Point) {
    let floor = spec.floor_y();
    let base = Point::new(spec.length / 2.0 + 3.0, floor, 0.0);
    let entry = Point::new(spec.length / 2.0, plane_y, 0.0);

    let mut feed = Vec::new();
    push_segment(&mut feed, Point::new(base.x, floor + 2.5, 0.0), entry, FEED_RADIUS);

    let vessel = Vessel {
        base,
        height: TANK_HEIGHT,
        radius: TANK_RADIUS,
    };
    (vec![vessel], feed, entry)
}

/// Spine along Z at `entry.x` covering every nozzle, plus one branch per nozzle.
pub fn fan_out(entry: Point, nozzles: &[NozzleTarget]) -> (Option<Spine>, Vec<RouteSegment>, Vec<RouteSegment>) {
    let Some(first) = nozzles.first() else {
        return (None, Vec::new(), Vec::new());
    };

    let y = first.position.y;
    let (z_min, z_max) = nozzles.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), n| {
        (lo.min(n.position.z), hi.max(n.position.z))
    });
    let spine = Spine {
        x: entry.x,
        y,
        z_min,
        z_max,
    };

    let mut spine_segments = Vec::new();
    let spine_start = Point::new(entry.x, y, z_min);
    push_segment(&mut spine_segments, entry, spine_start, SPINE_RADIUS);
    push_segment(
        &mut spine_segments,
        spine_start,
        Point::new(entry.x, y, z_max),
        SPINE_RADIUS,
    );

    let mut branches = Vec::with_capacity(nozzles.len());
    for n in nozzles {
        push_segment(
            &mut branches,
            Point::new(entry.x, y, n.position.z),
            n.position,
            BRANCH_RADIUS,
        );
    }

    (Some(spine), spine_segments, branches)
}
