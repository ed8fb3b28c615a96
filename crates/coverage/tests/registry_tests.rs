//! Registry behavior against directory and in-memory sources.

use coverage::{CoverageRegistry, DescriptionSource, DirectorySource, MemorySource};
use std::sync::Arc;
use test_utils::{climate, crs, description_document, UNIT_10X10};
use zonal_common::ZonalError;

fn model_description(coverage_id: &str) -> serde_json::Value {
    description_document(
        coverage_id,
        &[("model", &climate::MODELS[..])],
        &UNIT_10X10,
        crs::EPSG_3338,
    )
}

#[tokio::test]
async fn test_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ak_temp.json"),
        serde_json::to_vec(&model_description("ak_temp")).unwrap(),
    )
    .unwrap();

    let source = DirectorySource::new(dir.path());
    let registry = CoverageRegistry::new();

    let descriptor = registry.load("ak_temp", &source).await.unwrap();
    assert_eq!(descriptor.label("model", 2).unwrap(), "NCAR-CCSM4");

    // Cached: the file is no longer needed
    std::fs::remove_file(dir.path().join("ak_temp.json")).unwrap();
    let again = registry.load("ak_temp", &source).await.unwrap();
    assert!(Arc::ptr_eq(&descriptor, &again));
}

#[tokio::test]
async fn test_missing_description_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirectorySource::new(dir.path());
    let err = source.describe("absent").await.unwrap_err();
    assert!(matches!(err, ZonalError::Io(_)));
}

#[tokio::test]
async fn test_preload_many() {
    let source = MemorySource::new()
        .with("a", model_description("a"))
        .with("b", model_description("b"));
    let registry = CoverageRegistry::new();

    let loaded = registry.preload(&["a", "b"], &source).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_preload_reports_any_failure() {
    let source = MemorySource::new().with("a", model_description("a"));
    let registry = CoverageRegistry::new();

    let result = registry.preload(&["a", "missing"], &source).await;
    assert!(result.is_err());
    assert!(registry.get("missing").is_none());
}

#[tokio::test]
async fn test_concurrent_first_access_yields_one_entry() {
    let source = Arc::new(MemorySource::new().with("shared", model_description("shared")));
    let registry = Arc::new(CoverageRegistry::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let source = source.clone();
        handles.push(tokio::spawn(async move {
            registry.load("shared", source.as_ref()).await.unwrap()
        }));
    }

    let mut descriptors = Vec::new();
    for handle in handles {
        descriptors.push(handle.await.unwrap());
    }

    assert_eq!(registry.len(), 1);
    let kept = registry.get("shared").unwrap();
    assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, &kept)));
}
