//! Error types for zonal aggregation.

use thiserror::Error;

/// Result type alias using ZonalError.
pub type ZonalResult<T> = Result<T, ZonalError>;

/// Primary error type for the aggregation engine and its collaborators.
#[derive(Debug, Error)]
pub enum ZonalError {
    // === Engine Errors ===
    #[error("Malformed coverage description: {0}")]
    MetadataFormat(String),

    #[error("Spatial reference error: {0}")]
    SpatialReference(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("No label for coordinate {coordinate} on axis '{axis}'")]
    DecodeKey { axis: String, coordinate: i64 },

    // === Result Tree Errors ===
    #[error("Path not found in result tree: {0}")]
    PathNotFound(String),

    #[error("Invalid result tree operation: {0}")]
    InvalidTree(String),

    // === Input Errors ===
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ZonalError {
    /// Create a MetadataFormat error.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::MetadataFormat(msg.into())
    }

    /// Create a SpatialReference error.
    pub fn spatial_reference(msg: impl Into<String>) -> Self {
        Self::SpatialReference(msg.into())
    }

    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a DecodeKey error.
    pub fn decode_key(axis: impl Into<String>, coordinate: i64) -> Self {
        Self::DecodeKey {
            axis: axis.into(),
            coordinate,
        }
    }

    /// Short machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ZonalError::MetadataFormat(_) => "MetadataFormatError",
            ZonalError::SpatialReference(_) => "SpatialReferenceError",
            ZonalError::NoData(_) => "NoDataError",
            ZonalError::DecodeKey { .. } => "DecodeKeyError",
            ZonalError::PathNotFound(_) => "PathNotFound",
            ZonalError::InvalidTree(_) => "InvalidTree",
            ZonalError::InvalidGrid(_) => "InvalidGrid",
            ZonalError::InvalidGeometry(_) => "InvalidGeometry",
            ZonalError::Config(_) => "ConfigError",
            ZonalError::Io(_) => "IoError",
        }
    }

    /// Get the HTTP status code a caller should report for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ZonalError::InvalidGeometry(_) => 400,

            ZonalError::NoData(_) => 404,

            ZonalError::SpatialReference(_) => 422,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for ZonalError {
    fn from(err: std::io::Error) -> Self {
        ZonalError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZonalError {
    fn from(err: serde_json::Error) -> Self {
        ZonalError::MetadataFormat(format!("JSON error: {}", err))
    }
}
