//! Model Record Tests
//!
//! Records saved through models produced by a reconciliation pass:
//! - Timestamps are stamped by the pre-save hook
//! - Required columns are enforced before anything is stored
//! - Undeclared fields are dropped
//! - Internal fields never leave the model

use std::sync::Arc;

use modelgate::model::{ModelError, ModelRegistry};
use modelgate::reconcile::Reconciler;
use modelgate::schema::{SchemaErrorCode, TimestampMode, CREATED_AT, UPDATED_AT};
use modelgate::store::{DocumentStore, MemoryStore};
use modelgate::DescriptorSource;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn descriptors() -> Vec<DescriptorSource> {
    vec![
        DescriptorSource::new(
            "points.table.json",
            json!({
                "version": 1,
                "columns": {
                    "lat": {"type": "Number", "required": true},
                    "lng": {"type": "Number", "required": true},
                    "label": {"type": "String", "default": "unnamed"},
                    "owner": {"type": "ObjectReference"},
                    "updatedAt": {"type": "Date"}
                }
            }),
        ),
        DescriptorSource::new(
            "events.table.json",
            json!({
                "version": 4,
                "columns": {
                    "payload": {"type": "Opaque", "required": true},
                    "seenAt": {"type": "Date", "default": "$now"}
                },
                "extraOptions": {"createdAt": false}
            }),
        ),
    ]
}

async fn setup(mode: TimestampMode) -> (Arc<MemoryStore>, ModelRegistry) {
    let store = Arc::new(MemoryStore::new());
    let models = Reconciler::new(store.clone())
        .with_timestamp_mode(mode)
        .run(descriptors())
        .await
        .unwrap();
    (store, models)
}

// =============================================================================
// Save Path
// =============================================================================

#[tokio::test]
async fn test_save_stamps_timestamps() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let saved = points
        .save(store.as_ref(), json!({"lat": 52.1, "lng": 4.3}))
        .await
        .unwrap();

    assert!(saved[CREATED_AT].is_string());
    assert!(saved[UPDATED_AT].is_string());
    assert_eq!(saved["label"], "unnamed");
    assert!(saved.get("__v").is_none());
}

#[tokio::test]
async fn test_created_at_disabled() {
    let (store, models) = setup(TimestampMode::Symmetric).await;
    let events = models.get("events").unwrap();

    let saved = events
        .save(store.as_ref(), json!({"payload": {"kind": "ping"}}))
        .await
        .unwrap();

    assert!(saved.get(CREATED_AT).is_none());
    assert!(saved[UPDATED_AT].is_string());
    assert!(saved["seenAt"].is_string());
    assert_eq!(saved["payload"]["kind"], "ping");
}

#[tokio::test]
async fn test_required_column_enforced() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let err = points
        .save(store.as_ref(), json!({"lat": 52.1}))
        .await
        .unwrap_err();

    match &err {
        ModelError::Validation(e) => {
            assert_eq!(e.code(), SchemaErrorCode::ValidationFailed);
            assert_eq!(e.details().unwrap().field, "lng");
            assert_eq!(e.table(), "points");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(points.all(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_type_checked_columns() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let err = points
        .save(store.as_ref(), json!({"lat": "north", "lng": 4.3}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MG_SCHEMA_VALIDATION_FAILED");

    let err = points
        .save(store.as_ref(), json!({"lat": 1, "lng": 2, "owner": 17}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MG_SCHEMA_VALIDATION_FAILED");
}

#[tokio::test]
async fn test_defaults_fill_only_absent_columns() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let defaulted = points
        .save(store.as_ref(), json!({"lat": 1, "lng": 2}))
        .await
        .unwrap();
    assert_eq!(defaulted["label"], json!("unnamed"));

    let cleared = points
        .save(store.as_ref(), json!({"lat": 1, "lng": 2, "label": null}))
        .await
        .unwrap();
    assert_eq!(cleared.get("label"), Some(&json!(null)));
}

#[tokio::test]
async fn test_undeclared_fields_dropped() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let saved = points
        .save(
            store.as_ref(),
            json!({"_id": "p1", "lat": 1, "lng": 2, "color": "red", "__secret": 1}),
        )
        .await
        .unwrap();
    assert!(saved.get("color").is_none());

    let stored = store.get("points", "p1").await.unwrap().unwrap();
    assert!(stored.get("color").is_none());
    assert!(stored.get("__secret").is_none());
    assert_eq!(stored["__v"], 0);
}

#[tokio::test]
async fn test_resave_keeps_created_at() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();

    let first = points
        .save(store.as_ref(), json!({"_id": "p1", "lat": 1, "lng": 2}))
        .await
        .unwrap();
    let second = points
        .save(store.as_ref(), json!({"_id": "p1", "label": "harbour"}))
        .await
        .unwrap();

    assert_eq!(first[CREATED_AT], second[CREATED_AT]);
    assert_eq!(second["lat"], 1);
    assert_eq!(second["label"], "harbour");
    assert_eq!(store.get("points", "p1").await.unwrap().unwrap()["__v"], 1);
}

// =============================================================================
// Read Path
// =============================================================================

#[tokio::test]
async fn test_models_share_store_but_not_collections() {
    let (store, models) = setup(TimestampMode::Legacy).await;
    let points = models.get("points").unwrap();
    let events = models.get("events").unwrap();

    points
        .save(store.as_ref(), json!({"lat": 1, "lng": 2}))
        .await
        .unwrap();

    assert_eq!(points.all(store.as_ref()).await.unwrap().len(), 1);
    assert!(events.all(store.as_ref()).await.unwrap().is_empty());
    assert!(points.find_by_id(store.as_ref(), "missing").await.unwrap().is_none());
}
