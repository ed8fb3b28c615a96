//! Error types for reprojection.

use thiserror::Error;
use zonal_common::ZonalError;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnknownCrs(u16),

    #[error("Invalid projection definition for EPSG:{epsg}: {message}")]
    InvalidDefinition { epsg: u16, message: String },

    #[error("Transform from EPSG:{from} to EPSG:{to} failed: {message}")]
    TransformFailed { from: u16, to: u16, message: String },
}

impl From<ProjectionError> for ZonalError {
    fn from(err: ProjectionError) -> Self {
        ZonalError::SpatialReference(err.to_string())
    }
}
