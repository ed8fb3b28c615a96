//! Coverage metadata: axes, dimension encodings and the registry.
//!
//! A remote coverage describes its axes and, embedded as a serialized
//! table, the mapping from integer axis coordinates to semantic labels
//! (`0 -> "CRU-TS"`, `1 -> "GFDL-CM3"`, ...). This crate decodes that
//! description into a [`CoverageDescriptor`] and keeps one descriptor per
//! coverage id in a [`CoverageRegistry`] for the life of the process.
//!
//! # Example
//!
//! ```ignore
//! use coverage::{CoverageRegistry, DirectorySource};
//!
//! let registry = CoverageRegistry::new();
//! let source = DirectorySource::new("descriptions/");
//! let descriptor = registry.load("ak_snow_sfe", &source).await?;
//! let label = descriptor.label("model", 0)?;
//! ```

pub mod axis;
pub mod decoder;
pub mod descriptor;
pub mod encoding;
pub mod registry;
pub mod source;

pub use axis::{AxisCoordinates, AxisDescriptor, AxisKind, SpatialRole};
pub use decoder::decode_description;
pub use descriptor::CoverageDescriptor;
pub use encoding::{parse_encoding_table, DimensionEncoding};
pub use registry::CoverageRegistry;
pub use source::{DescriptionSource, DirectorySource, MemorySource};
