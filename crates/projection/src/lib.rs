//! Coordinate reference system transformations.
//!
//! Wraps the pure-Rust `proj4rs` port of PROJ, with projection definitions
//! looked up by EPSG code from the `crs-definitions` database. Polygons and
//! boxes are reprojected vertex by vertex; nothing here knows about grids.

pub mod error;
pub mod transform;

pub use error::ProjectionError;
pub use transform::{is_geographic, project_point, reproject_area, reproject_bbox, Reprojector};
