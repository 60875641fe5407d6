mod common;

use std::{sync::Arc, time::Duration};

use common::{FORECAST_PATH, GEOCODE_PATH, openweather, requests_to, service, start};
use forecast_deck::{
    cache::{
        CacheSource, STORAGE_PREFIX,
        clock::{Clock, ManualClock},
    },
    data::storage::{FileStore, KeyValueStore, MemoryStore},
    domain::forecast::Coords,
};

const TTL: Duration = Duration::from_secs(600);

#[tokio::test]
async fn second_lookup_is_served_from_memory() {
    let server = openweather().await;
    let (service, _) = service(
        &server.uri(),
        Arc::new(MemoryStore::new()),
        Arc::new(ManualClock::new(start())),
    );

    let first = service.forecast_by_city("Paris", TTL).await.expect("first");
    let second = service.forecast_by_city("PARIS", TTL).await.expect("second");

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Memory);
    assert_eq!(first.data(), second.data());
    assert_eq!(requests_to(&server, FORECAST_PATH).await, 1);
    // `city:` entries are never written, so each lookup geocodes again.
    assert_eq!(requests_to(&server, GEOCODE_PATH).await, 2);
}

#[tokio::test]
async fn durable_entries_survive_a_restart() {
    let server = openweather().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("store.json");
    let clock = Arc::new(ManualClock::new(start()));

    let (first_run, _) = service(
        &server.uri(),
        Arc::new(FileStore::new(&store_path)),
        Arc::clone(&clock),
    );
    first_run
        .forecast_by_coords(Coords::new(48.85, 2.35), TTL)
        .await
        .expect("network fetch");

    let store = Arc::new(FileStore::new(&store_path));
    let keys = store.keys().expect("keys");
    assert_eq!(keys, vec![format!("{STORAGE_PREFIX}coords:48.85,2.35")]);

    let (second_run, cache) = service(&server.uri(), store, clock);
    let hit = second_run
        .forecast_by_coords(Coords::new(48.85, 2.35), TTL)
        .await
        .expect("storage hit");
    assert_eq!(hit.source, CacheSource::Storage);
    assert_eq!(cache.memory_keys(), vec!["coords:48.85,2.35".to_string()]);

    let again = second_run
        .forecast_by_coords(Coords::new(48.85, 2.35), TTL)
        .await
        .expect("memory hit");
    assert_eq!(again.source, CacheSource::Memory);
    assert_eq!(requests_to(&server, FORECAST_PATH).await, 1);
}

#[tokio::test]
async fn expired_entries_are_fetched_again() {
    let server = openweather().await;
    let clock = Arc::new(ManualClock::new(start()));
    let (service, _) = service(&server.uri(), Arc::new(MemoryStore::new()), Arc::clone(&clock));
    let paris = Coords::new(48.85, 2.35);

    service.forecast_by_coords(paris, TTL).await.expect("first");
    clock.advance(chrono::Duration::minutes(9));
    let warm = service.forecast_by_coords(paris, TTL).await.expect("warm");
    assert_eq!(warm.source, CacheSource::Memory);

    // Age equal to the TTL is already stale.
    clock.advance(chrono::Duration::minutes(1));
    let refetched = service.forecast_by_coords(paris, TTL).await.expect("refetch");
    assert_eq!(refetched.source, CacheSource::Network);
    assert_eq!(refetched.entry.fetched_at, clock.now());
    assert_eq!(requests_to(&server, FORECAST_PATH).await, 2);
}

#[tokio::test]
async fn clearing_empties_both_tiers() {
    let server = openweather().await;
    let store = Arc::new(MemoryStore::new());
    store.set("savedCities", "[\"Paris\"]").expect("seed");
    let (service, _) = service(
        &server.uri(),
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        Arc::new(ManualClock::new(start())),
    );

    service.forecast_by_city("Paris", TTL).await.expect("fetch");
    service.clear_cache();

    assert!(service.cached_keys().is_empty());
    assert_eq!(store.keys().expect("keys"), vec!["savedCities".to_string()]);
    let after = service.forecast_by_city("Paris", TTL).await.expect("fetch again");
    assert_eq!(after.source, CacheSource::Network);
}
