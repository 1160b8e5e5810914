//! Shared tolerances for the sweep and for diagram finalization.

/// Absolute part of the comparison tolerance.
///
/// Values closer than this are treated as equal regardless of magnitude.
pub const EPSILON_ABS: f64 = 1e-9;

/// Relative part of the comparison tolerance, scaled by the larger operand.
pub const EPSILON_REL: f64 = 1e-12;

/// Sites closer than this (Euclidean) are merged before the sweep when
/// preprocessing is enabled.
pub const DEFAULT_MERGE_DISTANCE: f64 = 1e-9;

/// Vertices joined by an edge shorter than this are merged during finalize.
///
/// Cocircular sites produce several circle events at the same center; this
/// collapses the resulting zero-length edges into a single vertex.
pub const VERTEX_MERGE_DISTANCE: f64 = 1e-7;

/// Default bounding-box padding as a fraction of the larger site extent.
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.1;

/// Minimum absolute bounding-box padding (used when all sites are collinear or
/// coincident and the extent collapses).
pub const DEFAULT_MIN_MARGIN: f64 = 1.0;

/// Combined absolute + relative tolerance for two magnitudes.
#[inline]
pub fn tolerance(a: f64, b: f64) -> f64 {
    EPSILON_ABS + EPSILON_REL * a.abs().max(b.abs())
}
