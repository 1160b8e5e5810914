//! Tooling around `fortune-voronoi`: point generators, Lloyd relaxation,
//! diagram validation and JSON export.

pub mod export;
pub mod geometry;
pub mod util;
