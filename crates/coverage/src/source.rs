//! Where coverage descriptions come from.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use zonal_common::{ZonalError, ZonalResult};

/// Fetches the raw description document of a coverage.
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    async fn describe(&self, coverage_id: &str) -> ZonalResult<Value>;
}

/// Reads `<dir>/<coverage_id>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, coverage_id: &str) -> ZonalResult<PathBuf> {
        let unsafe_id = coverage_id.contains(['/', '\\']) || coverage_id.contains("..");
        if coverage_id.is_empty() || unsafe_id {
            return Err(ZonalError::Config(format!("Invalid coverage id '{}'", coverage_id)));
        }
        Ok(self.root.join(format!("{}.json", coverage_id)))
    }
}

#[async_trait]
impl DescriptionSource for DirectorySource {
    async fn describe(&self, coverage_id: &str) -> ZonalResult<Value> {
        let path = self.path_for(coverage_id)?;
        debug!(path = %path.display(), "Reading coverage description");

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ZonalError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// In-memory descriptions, for tests and embedded catalogs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, coverage_id: impl Into<String>, document: Value) -> Self {
        self.documents.insert(coverage_id.into(), document);
        self
    }
}

#[async_trait]
impl DescriptionSource for MemorySource {
    async fn describe(&self, coverage_id: &str) -> ZonalResult<Value> {
        self.documents
            .get(coverage_id)
            .cloned()
            .ok_or_else(|| ZonalError::Io(format!("Unknown coverage '{}'", coverage_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new().with("a", json!({"k": 1}));
        assert_eq!(source.describe("a").await.unwrap(), json!({"k": 1}));
        assert!(matches!(source.describe("b").await, Err(ZonalError::Io(_))));
    }

    #[tokio::test]
    async fn test_directory_source_rejects_traversal() {
        let source = DirectorySource::new("/tmp");
        let err = source.describe("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, ZonalError::Config(_)));
    }
}
