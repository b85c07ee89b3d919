pub mod asset;
pub mod config;
pub mod design;
pub mod gas;
pub mod geom;
pub mod layout;
pub mod name;
pub mod pick;
pub mod report;
pub mod room;
pub mod route;
pub mod uid;

// Prelude
pub use asset::{Asset, AssetData, AssetKind, AssetRegistry, DoorStyle, Placement};
pub use config::{DesignConfig, DetectionConfig, DetectionSystem, ExtinguishingSystem};
pub use design::Design;
pub use gas::{GasQuantityService, GasRequest, GasResponse, LocalGasCalculator};
pub use geom::point::Point;
pub use geom::ray::Ray;
pub use geom::segment::RouteSegment;
pub use geom::vector::Vector;
pub use layout::{Layout, NozzleTarget, UseCase};
pub use name::{HasIndex, HasName, SortByIndex};
pub use pick::{PlacementMode, SnapSettings, View};
pub use report::ReportSummary;
pub use room::{Layer, RoomModel, RoomSpec};
pub use uid::UID;
