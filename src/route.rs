//! Pipe and conduit routing.
//!
//! Both routers use fixed axis-aligned heuristics rather than a general path
//! planner, so the resulting schematics are predictable and easy to read.

pub mod distribution;
pub mod stack;

pub use distribution::{AgentSource, DistributionNetwork, Spine, route_distribution};
pub use stack::{ConduitPath, DetectionLine, DetectionNetwork, Stack, StackRouter, route_detection};
