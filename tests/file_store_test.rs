mod common;

use std::sync::Arc;

use tempfile::TempDir;
use trip_itinerary::{
    fetch_record, services::parse_and_validate, CacheRecord, FilePlanStore, ItineraryPlanner,
    PlanSource, PlanStore, PlannerError, StoreError, StoreKey,
};

use common::{envelope, plan_text, trip, ScriptedGenerator, UnreachableGenerator};

fn record(label: &str, budget: f64) -> CacheRecord {
    CacheRecord::new(
        &trip(budget),
        parse_and_validate(&plan_text(2, label)).unwrap(),
    )
}

#[tokio::test]
async fn test_set_get_overwrite_delete() {
    let dir = TempDir::new().unwrap();
    let store = FilePlanStore::new(dir.path());
    let key = StoreKey::new("owner-1", "trip-1");

    assert!(store.get(&key).await.unwrap().is_none());
    assert!(!store.exists(&key).await.unwrap());

    let first = record("first", 1000.0);
    store.set(&key, &first).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(first));

    let second = record("second", 2000.0);
    store.set(&key, &second).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), Some(second));
    assert!(store.exists(&key).await.unwrap());

    assert!(store.delete(&key).await.unwrap());
    assert!(!store.delete(&key).await.unwrap());
    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_document_layout_is_canonical() {
    let dir = TempDir::new().unwrap();
    let store = FilePlanStore::new(dir.path());
    let key = StoreKey::new("owner-1", "trip-1");
    store.set(&key, &record("layout", 1000.0)).await.unwrap();

    let trips_dir = dir.path().join("users/owner-1/trips");
    let entries: Vec<_> = std::fs::read_dir(&trips_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, ["trip-1.json"]);

    let document: serde_json::Value =
        serde_json::from_slice(&std::fs::read(trips_dir.join("trip-1.json")).unwrap()).unwrap();
    assert_eq!(document["ownerId"], "owner-1");
    assert_eq!(document["sourceRequest"]["transportModes"], serde_json::json!(["bus", "flight"]));
    assert_eq!(document["sourceRequest"]["startDate"], "2025-05-10");
    assert_eq!(
        document["plan"]["days"][0]["activities"][0]["distanceFromPrevious"],
        "0 km"
    );
    assert!(document["createdAt"].is_string());
}

#[tokio::test]
async fn test_corrupt_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = FilePlanStore::new(dir.path());
    let key = StoreKey::new("owner-1", "trip-1");
    let path = store.path_for(&key).unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"{ not json").unwrap();

    let err = store.get(&key).await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));

    let planner = ItineraryPlanner::new(Arc::new(store), Arc::new(UnreachableGenerator));
    let err = planner.get_or_create_plan(&trip(1000.0)).await.unwrap_err();
    assert!(matches!(err, PlannerError::Store(StoreError::Corrupt { .. })));
}

#[tokio::test]
async fn test_plans_survive_planner_restart() {
    let dir = TempDir::new().unwrap();
    let request = trip(1000.0);

    let generator = Arc::new(ScriptedGenerator::new([envelope(&plan_text(2, "durable"))]));
    let first = ItineraryPlanner::new(Arc::new(FilePlanStore::new(dir.path())), generator.clone())
        .resolve(&request)
        .await
        .unwrap();
    assert_eq!(first.source, PlanSource::Generated);
    assert_eq!(generator.calls(), 1);

    let second = ItineraryPlanner::new(
        Arc::new(FilePlanStore::new(dir.path())),
        Arc::new(UnreachableGenerator),
    )
    .resolve(&request)
    .await
    .unwrap();

    assert_eq!(second.source, PlanSource::Cached);
    assert_eq!(second.plan, first.plan);
}

#[tokio::test]
async fn test_padded_destination_hits_after_reload() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(ScriptedGenerator::new([envelope(&plan_text(2, "padded"))]));
    let planner = ItineraryPlanner::new(Arc::new(FilePlanStore::new(dir.path())), generator.clone());

    let mut request = trip(1000.0);
    request.destination = "Goa ".into();
    request.validate().unwrap();

    let first = planner.resolve(&request).await.unwrap();
    let second = planner.resolve(&request).await.unwrap();

    assert_eq!(first.source, PlanSource::Generated);
    assert_eq!(second.source, PlanSource::Cached);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_fetch_record_without_generator() {
    let dir = TempDir::new().unwrap();
    let store = FilePlanStore::new(dir.path());
    let stored = record("fetched", 1000.0);
    store.set(&stored.key(), &stored).await.unwrap();

    assert_eq!(fetch_record(&store, "owner-1", "trip-1").await.unwrap(), stored);

    let err = fetch_record(&store, "owner-1", "trip-9").await.unwrap_err();
    assert!(matches!(err, PlannerError::PlanNotFound { .. }));

    let err = fetch_record(&store, "..", "trip-1").await.unwrap_err();
    assert!(matches!(err, PlannerError::Validation { field: "ownerId", .. }));
}
