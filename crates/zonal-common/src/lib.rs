//! Common types and utilities shared across the zonal aggregation crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod geometry;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{ZonalError, ZonalResult};
pub use geometry::AreaOfInterest;
