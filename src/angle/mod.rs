//! Angle geometry for three surface points.

pub mod compute;
pub mod label;

pub use compute::{centroid, compute_angle, compute_vertex, rotation_axis, AngleResult, DEGENERATE_EPSILON};
pub use label::{billboard_rotation, format_angle, LabelPlacement, LabelPlacer, PLACEHOLDER};
