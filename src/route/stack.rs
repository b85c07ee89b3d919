//! Conduit routing for aspirating line-detection units.
//!
//! Sampling lines run along X inside each monitored layer. Both ends of every
//! line are piped to a line-detection unit. Units mounted above each other
//! share one duct, so a line end is always piped to the lowest unit of the
//! stack its nearest unit belongs to, and the vertical drop jumps over the
//! bodies of the units it passes.

use crate::asset::{AssetKind, AssetRegistry, UNIT_HEIGHT, UNIT_INLET_OFFSET};
use crate::geom::segment::{RouteSegment, push_segment, total_length};
use crate::room::{Layer, RoomSpec};
use crate::{Point, UID};
use tracing::debug;

/// Units closer than this in X and Z belong to the same stack.
pub const STACK_TOLERANCE: f64 = 0.1;
pub const CONDUIT_RADIUS: f64 = 0.02;
/// Distance kept between sampling lines and the walls.
pub const LINE_MARGIN: f64 = 1.0;
/// Spacing of sampling holes along a line.
pub const SAMPLE_SPACING: f64 = 3.0;

/// Y of the sampling lines in a layer.
pub fn line_height(spec: &RoomSpec, layer: Layer) -> f64 {
    match layer {
        Layer::Ceiling => spec.total_height() - 0.2,
        Layer::Occupied => spec.ceiling_y() - 0.2,
        Layer::RaisedFloor => spec.height_fp - 0.1,
    }
}

/// One straight sampling line running along X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionLine {
    pub layer: Layer,
    pub y: f64,
    pub z: f64,
    pub x_start: f64,
    pub x_end: f64,
}

impl DetectionLine {
    /// Both line ends; each one is piped to a unit.
    pub fn endpoints(&self) -> [Point; 2] {
        [
            Point::new(self.x_start, self.y, self.z),
            Point::new(self.x_end, self.y, self.z),
        ]
    }

    /// Sampling holes every [`SAMPLE_SPACING`] from the line start.
    pub fn samples(&self) -> Vec<Point> {
        let mut pts = Vec::new();
        let mut i = 0;
        loop {
            let x = self.x_start + i as f64 * SAMPLE_SPACING;
            if x > self.x_end + 1e-9 {
                break;
            }
            pts.push(Point::new(x, self.y, self.z));
            i += 1;
        }
        pts
    }

    pub fn segment(&self) -> Option<RouteSegment> {
        let [a, b] = self.endpoints();
        RouteSegment::new(a, b, CONDUIT_RADIUS)
    }
}

/// Sampling lines for the given layers.
///
/// Each layer gets `max(2, floor(width / 4))` lines evenly spread between
/// the wall margins. Rooms too small to keep the margins get no lines,
/// so no line endpoints are routed either.
pub fn detection_lines(spec: &RoomSpec, layers: &[Layer]) -> Vec<DetectionLine> {
    let len = spec.length - 2.0 * LINE_MARGIN;
    let span = spec.width - 2.0 * LINE_MARGIN;
    if len <= 0.0 || span < 0.0 {
        return Vec::new();
    }

    let count = ((spec.width / 4.0).floor() as usize).max(2);
    let spacing = span / (count - 1) as f64;

    let mut lines = Vec::new();
    for &layer in layers {
        let y = line_height(spec, layer);
        for i in 0..count {
            lines.push(DetectionLine {
                layer,
                y,
                z: -spec.width / 2.0 + LINE_MARGIN + i as f64 * spacing,
                x_start: -len / 2.0,
                x_end: len / 2.0,
            });
        }
    }
    lines
}

/// A unit as seen by the router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackMember {
    pub uid: UID,
    pub position: Point,
}

impl StackMember {
    pub fn inlet(&self) -> Point {
        self.position.with_y(self.position.y + UNIT_INLET_OFFSET)
    }

    pub fn top(&self) -> f64 {
        self.position.y + UNIT_HEIGHT / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.position.y - UNIT_HEIGHT / 2.0
    }
}

/// Units sharing one footprint. `exit` is the lowest member.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub x: f64,
    pub z: f64,
    pub members: Vec<StackMember>,
    pub exit: StackMember,
}

impl Stack {
    pub fn contains(&self, uid: &UID) -> bool {
        self.members.iter().any(|m| m.uid == *uid)
    }

    /// Members above the exit unit, highest first.
    pub fn upper_members(&self) -> Vec<StackMember> {
        let mut upper: Vec<StackMember> = self
            .members
            .iter()
            .filter(|m| m.uid != self.exit.uid && m.position.y > self.exit.position.y)
            .copied()
            .collect();
        upper.sort_by(|a, b| b.position.y.total_cmp(&a.position.y));
        upper
    }
}

/// Groups units by footprint.
pub fn discover_stacks(units: &[StackMember]) -> Vec<Stack> {
    let mut groups: Vec<(f64, f64, Vec<StackMember>)> = Vec::new();
    for unit in units {
        let p = unit.position;
        match groups
            .iter_mut()
            .find(|(x, z, _)| (x - p.x).abs() < STACK_TOLERANCE && (z - p.z).abs() < STACK_TOLERANCE)
        {
            Some((_, _, members)) => members.push(*unit),
            None => groups.push((p.x, p.z, vec![*unit])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(x, z, members)| {
            let exit = *members
                .iter()
                .min_by(|a, b| a.position.y.total_cmp(&b.position.y))?;
            Some(Stack { x, z, members, exit })
        })
        .collect()
}

/// Routed conduit from one line end to a stack's exit unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ConduitPath {
    pub endpoint: Point,
    pub exit_unit: UID,
    pub inlet: Point,
    pub segments: Vec<RouteSegment>,
}

impl ConduitPath {
    pub fn length(&self) -> f64 {
        total_length(&self.segments)
    }

    /// Point where the path ends (the endpoint itself if nothing was emitted).
    pub fn terminus(&self) -> Point {
        self.segments.last().map(|s| s.end).unwrap_or(self.endpoint)
    }
}

/// Routes line ends into the stacks of the placed units.
#[derive(Debug, Clone)]
pub struct StackRouter {
    units: Vec<StackMember>,
    stacks: Vec<Stack>,
}

impl StackRouter {
    pub fn new(units: Vec<StackMember>) -> Self {
        let stacks = discover_stacks(&units);
        Self { units, stacks }
    }

    /// Router over every line-detection unit in the registry.
    pub fn from_registry(registry: &AssetRegistry) -> Self {
        let units = registry
            .iter()
            .filter(|a| a.kind() == AssetKind::LineDetectionUnit)
            .map(|a| StackMember {
                uid: a.uid,
                position: a.position(),
            })
            .collect();
        Self::new(units)
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Unit whose inlet is closest to `endpoint`.
    fn nearest_unit(&self, endpoint: Point) -> Option<&StackMember> {
        self.units
            .iter()
            .min_by(|a, b| endpoint.distance(&a.inlet()).total_cmp(&endpoint.distance(&b.inlet())))
    }

    /// Routes one line end. `None` when no unit is placed.
    pub fn route(&self, endpoint: Point) -> Option<ConduitPath> {
        let nearest = self.nearest_unit(endpoint)?;
        let stack = self.stacks.iter().find(|s| s.contains(&nearest.uid));
        let target = stack.map(|s| s.exit).unwrap_or(*nearest);
        let inlet = target.inlet();

        let mut segments = Vec::new();

        // Horizontal legs: along X, then along Z, at the endpoint's height
        let corner1 = Point::new(inlet.x, endpoint.y, endpoint.z);
        push_segment(&mut segments, endpoint, corner1, CONDUIT_RADIUS);
        let corner2 = Point::new(inlet.x, endpoint.y, inlet.z);
        push_segment(&mut segments, corner1, corner2, CONDUIT_RADIUS);

        if corner2.y > inlet.y {
            let at = |y: f64| Point::new(inlet.x, y, inlet.z);
            let mut current = corner2.y;
            let upper = stack.map(|s| s.upper_members()).unwrap_or_default();
            for unit in upper {
                if current > unit.top() {
                    push_segment(&mut segments, at(current), at(unit.top()), CONDUIT_RADIUS);
                }
                current = current.min(unit.bottom());
            }
            if current > inlet.y {
                push_segment(&mut segments, at(current), inlet, CONDUIT_RADIUS);
            }
        } else {
            push_segment(&mut segments, corner2, inlet, CONDUIT_RADIUS);
        }

        Some(ConduitPath {
            endpoint,
            exit_unit: target.uid,
            inlet,
            segments,
        })
    }

    pub fn route_all(&self, endpoints: &[Point]) -> Vec<ConduitPath> {
        endpoints.iter().filter_map(|&e| self.route(e)).collect()
    }
}

/// Sampling lines, holes and routed conduits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionNetwork {
    pub lines: Vec<DetectionLine>,
    pub samples: Vec<Point>,
    pub paths: Vec<ConduitPath>,
}

impl DetectionNetwork {
    /// Line tubes followed by every routed conduit segment.
    pub fn segments(&self) -> Vec<RouteSegment> {
        let mut segs: Vec<RouteSegment> = self.lines.iter().filter_map(|l| l.segment()).collect();
        segs.extend(self.paths.iter().flat_map(|p| p.segments.iter().copied()));
        segs
    }

    /// Total tube length: sampling lines plus conduits.
    pub fn conduit_length(&self) -> f64 {
        total_length(&self.segments())
    }
}

/// Builds the detection network for the given layers from scratch.
///
/// With no units placed the lines and holes are still returned, unconnected.
pub fn route_detection(spec: &RoomSpec, layers: &[Layer], registry: &AssetRegistry) -> DetectionNetwork {
    let lines = detection_lines(spec, layers);
    let samples: Vec<Point> = lines.iter().flat_map(|l| l.samples()).collect();
    let endpoints: Vec<Point> = lines.iter().flat_map(|l| l.endpoints()).collect();

    let router = StackRouter::from_registry(registry);
    let paths = router.route_all(&endpoints);
    debug!(
        lines = lines.len(),
        stacks = router.stacks().len(),
        paths = paths.len(),
        "rebuilt detection network"
    );

    DetectionNetwork {
        lines,
        samples,
        paths,
    }
}
