use thiserror::Error;

use crate::types::BoundingBox;

/// Errors that reject an input before any diagram is produced.
///
/// Geometric trouble met during the sweep (collinear triples, stale circle
/// events, coincident sites) is absorbed and reported through
/// [`crate::VoronoiDiagnostics`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoronoiError {
    /// No sites were supplied.
    #[error("insufficient sites: got {0}, need at least 1")]
    InsufficientSites(usize),

    /// A site has a NaN or infinite coordinate.
    #[error("site {index} has a non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate { index: usize, x: f64, y: f64 },

    /// A caller-supplied bounding box is empty, inverted or non-finite.
    #[error("invalid bounding box: min {:?}, max {:?}", .0.min, .0.max)]
    InvalidBounds(BoundingBox),
}

/// Three points are (nearly) collinear and have no finite circumcenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("degenerate geometry: points are collinear")]
pub struct DegenerateGeometry;
