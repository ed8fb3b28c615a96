//! Process-lifetime cache of decoded coverage descriptors.
//!
//! Descriptors are derived from immutable remote metadata, so two racing
//! first-accesses produce identical values. The first insert is kept and
//! every caller gets that entry back.

use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use zonal_common::ZonalResult;

use crate::decoder::decode_description;
use crate::descriptor::CoverageDescriptor;
use crate::source::DescriptionSource;

/// Registry of coverage descriptors keyed by coverage id.
///
/// Construct one at startup and share it (`Arc<CoverageRegistry>`) with
/// request handling.
#[derive(Default)]
pub struct CoverageRegistry {
    entries: RwLock<HashMap<String, Arc<CoverageDescriptor>>>,
}

impl CoverageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a descriptor without decoding.
    pub fn get(&self, coverage_id: &str) -> Option<Arc<CoverageDescriptor>> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = guard.get(coverage_id).cloned();
        if entry.is_some() {
            debug!(coverage_id = %coverage_id, "Coverage registry hit");
        }
        entry
    }

    /// Insert a descriptor. If the id is already present the existing
    /// entry is kept and returned.
    pub fn insert(&self, descriptor: CoverageDescriptor) -> Arc<CoverageDescriptor> {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        guard
            .entry(descriptor.coverage_id.clone())
            .or_insert_with(|| Arc::new(descriptor))
            .clone()
    }

    /// Return the cached descriptor, decoding `document` on first access.
    pub fn get_or_decode(
        &self,
        coverage_id: &str,
        document: &Value,
    ) -> ZonalResult<Arc<CoverageDescriptor>> {
        if let Some(existing) = self.get(coverage_id) {
            return Ok(existing);
        }

        let descriptor = decode_description(coverage_id, document)?;
        info!(
            coverage_id = %coverage_id,
            axes = descriptor.axes.len(),
            encodings = descriptor.encodings.len(),
            "Decoded coverage description"
        );
        Ok(self.insert(descriptor))
    }

    /// Return the cached descriptor, fetching its description from
    /// `source` on first access.
    pub async fn load(
        &self,
        coverage_id: &str,
        source: &dyn DescriptionSource,
    ) -> ZonalResult<Arc<CoverageDescriptor>> {
        if let Some(existing) = self.get(coverage_id) {
            return Ok(existing);
        }

        let document = source.describe(coverage_id).await?;
        self.get_or_decode(coverage_id, &document)
    }

    /// Load many coverages concurrently. Fails if any one fails.
    pub async fn preload(
        &self,
        coverage_ids: &[&str],
        source: &dyn DescriptionSource,
    ) -> ZonalResult<Vec<Arc<CoverageDescriptor>>> {
        try_join_all(coverage_ids.iter().map(|id| self.load(id, source))).await
    }

    /// Cached coverage ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
