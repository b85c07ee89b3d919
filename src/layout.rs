//! Use-case layouts: equipment footprints and nozzle targets.
//!
//! A layout is regenerated from scratch whenever the room or the use case
//! changes. Nozzles always hang [`NOZZLE_DROP`] below the ceiling plane.

use crate::Point;
use crate::geom::bboxes::BoundingBox;
use crate::room::RoomSpec;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Nozzle distance below the underside of the suspended ceiling.
pub const NOZZLE_DROP: f64 = 0.2;
/// Floor area covered by one nozzle when no count is known.
pub const AREA_PER_NOZZLE: f64 = 30.0;
/// Nozzle pitch along a datacenter aisle.
pub const AISLE_NOZZLE_SPACING: f64 = 3.0;
/// Free space between neighbouring racks in a row.
pub const RACK_SPACING: f64 = 0.05;
/// Racks stand this far above the walking surface.
pub const RACK_BASE_OFFSET: f64 = 0.05;
/// Row limit used when the row count is automatic.
pub const MAX_AUTO_ROWS: u32 = 100;

/// Datacenter rack geometry. Zero row or rack counts mean "as many as fit".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatacenterParams {
    pub rack_width: f64,
    pub rack_depth: f64,
    pub rack_height: f64,
    pub aisle_gap: f64,
    pub rows: u32,
    pub racks_per_row: u32,
}

impl Default for DatacenterParams {
    fn default() -> Self {
        Self {
            rack_width: 0.6,
            rack_depth: 1.2,
            rack_height: 2.0,
            aisle_gap: 1.2,
            rows: 0,
            racks_per_row: 0,
        }
    }
}

/// Size of one bedroom / guest room cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomGrid {
    pub cell_x: f64,
    pub cell_z: f64,
}

impl RoomGrid {
    pub fn new(cell_x: f64, cell_z: f64) -> Self {
        Self { cell_x, cell_z }
    }
}

impl Default for RoomGrid {
    fn default() -> Self {
        Self::new(4.0, 5.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UseCase {
    #[default]
    None,
    Datacenter(DatacenterParams),
    CareFacility(RoomGrid),
    Hotel(RoomGrid),
}

impl UseCase {
    pub fn validate(&self) -> Result<()> {
        match self {
            UseCase::None => {}
            UseCase::Datacenter(p) => {
                let dims = [
                    ("rack_width", p.rack_width),
                    ("rack_depth", p.rack_depth),
                    ("rack_height", p.rack_height),
                ];
                for (name, value) in dims {
                    if !value.is_finite() || value <= 0.0 {
                        bail!("Datacenter '{}' must be a positive number, got {}", name, value);
                    }
                }
                if !p.aisle_gap.is_finite() || p.aisle_gap < 0.0 {
                    bail!("Datacenter 'aisle_gap' must not be negative, got {}", p.aisle_gap);
                }
            }
            UseCase::CareFacility(g) | UseCase::Hotel(g) => {
                if !g.cell_x.is_finite() || g.cell_x <= 0.0 || !g.cell_z.is_finite() || g.cell_z <= 0.0 {
                    bail!("Room cell size must be positive, got {} x {}", g.cell_x, g.cell_z);
                }
            }
        }
        Ok(())
    }
}

/// Where one extinguishing nozzle goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NozzleTarget {
    pub position: Point,
}

impl NozzleTarget {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Point::new(x, y, z),
        }
    }
}

/// A room cell of a care facility or hotel, on the walking surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomCell {
    pub center: Point,
    pub size_x: f64,
    pub size_z: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub racks: Vec<BoundingBox>,
    pub cells: Vec<RoomCell>,
    pub nozzles: Vec<NozzleTarget>,
}

/// Height of the nozzle plane.
pub fn nozzle_height(spec: &RoomSpec) -> f64 {
    spec.ceiling_y() - NOZZLE_DROP
}

/// Generates the layout for `use_case`.
///
/// `nozzle_count` is the target for the uniform grid used without a use
/// case; `None` or zero falls back to one nozzle per [`AREA_PER_NOZZLE`].
pub fn generate(spec: &RoomSpec, use_case: &UseCase, nozzle_count: Option<u32>) -> Result<Layout> {
    spec.validate()?;
    use_case.validate()?;

    let layout = match use_case {
        UseCase::None => Layout {
            nozzles: uniform_grid(spec, nozzle_count),
            ..Layout::default()
        },
        UseCase::Datacenter(params) => Layout {
            racks: datacenter_racks(spec, params),
            nozzles: datacenter_nozzles(spec, params),
            ..Layout::default()
        },
        UseCase::CareFacility(grid) | UseCase::Hotel(grid) => {
            let cells = room_cells(spec, grid);
            let y = nozzle_height(spec);
            let nozzles = cells
                .iter()
                .map(|c| NozzleTarget::new(c.center.x, y, c.center.z))
                .collect();
            Layout {
                cells,
                nozzles,
                ..Layout::default()
            }
        }
    };

    debug!(
        racks = layout.racks.len(),
        cells = layout.cells.len(),
        nozzles = layout.nozzles.len(),
        "generated layout"
    );
    Ok(layout)
}

fn auto_racks_per_row(spec: &RoomSpec, params: &DatacenterParams) -> u32 {
    if params.racks_per_row > 0 {
        params.racks_per_row
    } else {
        ((spec.length - 4.0) / (params.rack_width + RACK_SPACING)).floor().max(0.0) as u32
    }
}

fn auto_rows(params: &DatacenterParams) -> u32 {
    if params.rows > 0 { params.rows } else { MAX_AUTO_ROWS }
}

/// Z of the centre line of rack row `r` before the back-to-back shift.
fn row_base_z(spec: &RoomSpec, params: &DatacenterParams, r: u32) -> f64 {
    let d = params.rack_depth;
    -spec.width / 2.0 + 2.0 + (r / 2) as f64 * (2.0 * d + params.aisle_gap) + d / 2.0
}

/// Rows come in back-to-back pairs separated by aisles.
fn datacenter_racks(spec: &RoomSpec, params: &DatacenterParams) -> Vec<BoundingBox> {
    let (w, d, h) = (params.rack_width, params.rack_depth, params.rack_height);
    let z_limit = spec.width / 2.0 - 1.0;
    let x_limit = spec.length / 2.0 - 1.0;
    let start_x = -spec.length / 2.0 + 2.0;
    let y = spec.floor_y() + RACK_BASE_OFFSET + h / 2.0;
    let per_row = auto_racks_per_row(spec, params);

    let mut racks = Vec::new();
    for r in 0..auto_rows(params) {
        let mut z = row_base_z(spec, params, r);
        if r % 2 == 1 {
            z += d;
        }
        if z + d / 2.0 > z_limit {
            break;
        }
        for k in 0..per_row {
            let x = start_x + k as f64 * (w + RACK_SPACING) + w / 2.0;
            if x + w / 2.0 > x_limit {
                break;
            }
            racks.push(BoundingBox::from_center_size(Point::new(x, y, z), w, h, d));
        }
    }
    racks
}

/// One nozzle line per odd row, centred on the aisle in front of the pair.
fn datacenter_nozzles(spec: &RoomSpec, params: &DatacenterParams) -> Vec<NozzleTarget> {
    let d = params.rack_depth;
    let gap = params.aisle_gap;
    let z_limit = spec.width / 2.0 - 1.0;
    let y = nozzle_height(spec);

    let mut nozzles = Vec::new();
    for r in 0..auto_rows(params) {
        let mut z = row_base_z(spec, params, r);
        if r % 2 == 1 {
            let aisle_z = z - d / 2.0 - gap / 2.0;
            if aisle_z + gap / 2.0 < z_limit {
                let mut i = 0;
                loop {
                    let x = -spec.length / 2.0 + 2.0 + i as f64 * AISLE_NOZZLE_SPACING;
                    if x >= spec.length / 2.0 - 2.0 {
                        break;
                    }
                    nozzles.push(NozzleTarget::new(x, y, aisle_z));
                    i += 1;
                }
            }
            z += d;
        }
        if z + d / 2.0 > z_limit {
            break;
        }
    }
    nozzles
}

/// Whole cells only, with the leftover split evenly on both sides.
fn room_cells(spec: &RoomSpec, grid: &RoomGrid) -> Vec<RoomCell> {
    let cols = (spec.length / grid.cell_x).floor() as usize;
    let rows = (spec.width / grid.cell_z).floor() as usize;
    let off_x = (spec.length - cols as f64 * grid.cell_x) / 2.0;
    let off_z = (spec.width - rows as f64 * grid.cell_z) / 2.0;

    let mut cells = Vec::with_capacity(cols * rows);
    for i in 0..rows {
        for j in 0..cols {
            let x = -spec.length / 2.0 + off_x + j as f64 * grid.cell_x + grid.cell_x / 2.0;
            let z = -spec.width / 2.0 + off_z + i as f64 * grid.cell_z + grid.cell_z / 2.0;
            cells.push(RoomCell {
                center: Point::new(x, spec.floor_y(), z),
                size_x: grid.cell_x,
                size_z: grid.cell_z,
            });
        }
    }
    cells
}

fn uniform_grid(spec: &RoomSpec, nozzle_count: Option<u32>) -> Vec<NozzleTarget> {
    let area = spec.area();
    let target = match nozzle_count {
        Some(n) if n > 0 => n as f64,
        _ => (area / AREA_PER_NOZZLE).ceil().max(1.0),
    };
    let spacing = (area / target).sqrt();
    let cols = (spec.length / spacing).floor() as usize;
    let rows = (spec.width / spacing).floor() as usize;
    if cols == 0 || rows == 0 {
        return Vec::new();
    }

    let start_x = -((cols - 1) as f64) * spacing / 2.0;
    let start_z = -((rows - 1) as f64) * spacing / 2.0;
    let y = nozzle_height(spec);

    let mut nozzles = Vec::with_capacity(cols * rows);
    for i in 0..cols {
        for j in 0..rows {
            nozzles.push(NozzleTarget::new(
                start_x + i as f64 * spacing,
                y,
                start_z + j as f64 * spacing,
            ));
        }
    }
    nozzles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::bboxes::are_bboxes_overlapping;

    fn room() -> RoomSpec {
        RoomSpec::new(20.0, 10.0, 0.5, 3.0, 0.5)
    }

    #[test]
    fn test_uniform_grid() -> Result<()> {
        // ceil(200 / 30) = 7 -> spacing ~5.35 -> 3 x 1
        let layout = generate(&room(), &UseCase::None, None)?;
        assert_eq!(layout.nozzles.len(), 3);
        assert!(layout.racks.is_empty());
        for n in &layout.nozzles {
            assert!((n.position.y - 3.3).abs() < 1e-12);
            assert!((n.position.z).abs() < 1e-12);
        }
        assert!((layout.nozzles[1].position.x).abs() < 1e-12);

        // 200 / 8 = 25 -> spacing 5 -> 4 x 2, symmetric around the origin
        let layout = generate(&room(), &UseCase::None, Some(8))?;
        assert_eq!(layout.nozzles.len(), 8);
        let sum_x: f64 = layout.nozzles.iter().map(|n| n.position.x).sum();
        let sum_z: f64 = layout.nozzles.iter().map(|n| n.position.z).sum();
        assert!(sum_x.abs() < 1e-9 && sum_z.abs() < 1e-9);
        assert!((layout.nozzles[0].position.x + 7.5).abs() < 1e-9);
        assert!((layout.nozzles[0].position.z + 2.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_care_facility_cells() -> Result<()> {
        let layout = generate(&room(), &UseCase::CareFacility(RoomGrid::new(4.0, 5.0)), None)?;
        // 5 x 2 cells, exactly filling the footprint
        assert_eq!(layout.cells.len(), 10);
        assert_eq!(layout.nozzles.len(), 10);
        assert!((layout.cells[0].center.x + 8.0).abs() < 1e-12);
        assert!((layout.cells[0].center.z + 2.5).abs() < 1e-12);

        let layout = generate(&room(), &UseCase::Hotel(RoomGrid::new(6.0, 4.0)), None)?;
        // 3 x 2 cells, 1 m left over along each axis
        assert_eq!(layout.cells.len(), 6);
        assert!((layout.cells[0].center.x + 6.0).abs() < 1e-12);
        assert!((layout.cells[0].center.z + 2.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_datacenter_racks_stay_inside_margin() -> Result<()> {
        let spec = RoomSpec::new(20.0, 12.0, 0.5, 3.0, 0.5);
        let layout = generate(&spec, &UseCase::Datacenter(DatacenterParams::default()), None)?;
        assert!(!layout.racks.is_empty());
        for rack in &layout.racks {
            assert!(rack.max.x <= spec.length / 2.0 - 1.0 + 1e-9);
            assert!(rack.max.z <= spec.width / 2.0 - 1.0 + 1e-9);
            assert!(rack.min.x >= -spec.length / 2.0 + 2.0 - 1e-9);
            assert!((rack.min.y - 0.55).abs() < 1e-12);
        }
        for (i, a) in layout.racks.iter().enumerate() {
            for b in &layout.racks[i + 1..] {
                let shrunk = BoundingBox::new(
                    Point::new(a.min.x + 0.01, a.min.y, a.min.z + 0.01),
                    Point::new(a.max.x - 0.01, a.max.y, a.max.z - 0.01),
                );
                assert!(!are_bboxes_overlapping(&shrunk, b));
            }
        }

        // floor(16 / 0.65) = 24 racks per row, 5 rows fit in 12 m
        assert_eq!(layout.racks.len(), 24 * 5);
        // one nozzle line per odd row, x = -8, -5, ..., 7
        assert_eq!(layout.nozzles.len(), 3 * 6);
        assert!((layout.nozzles[0].position.z + 4.6).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_datacenter_explicit_counts() -> Result<()> {
        let params = DatacenterParams {
            rows: 2,
            racks_per_row: 5,
            ..DatacenterParams::default()
        };
        let layout = generate(&room(), &UseCase::Datacenter(params), None)?;
        assert_eq!(layout.racks.len(), 10);
        Ok(())
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = UseCase::Hotel(RoomGrid::new(0.0, 3.0));
        assert!(generate(&room(), &bad, None).is_err());
        let bad_room = RoomSpec::new(-1.0, 10.0, 0.5, 3.0, 0.5);
        assert!(generate(&bad_room, &UseCase::None, None).is_err());
    }
}
