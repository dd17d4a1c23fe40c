//! Reconciliation behaviour across consecutive cycles

mod common;

use common::{fetch_error, strikes, FakeProvider, RecordingRegistrar};
use met_lightning::event::Attachment;
use met_lightning::{GeolocationEvent, LightningEventManager, RADIUS_SCALE};
use std::collections::HashSet;
use std::sync::Arc;

fn manager(
    script: Vec<met_lightning::api::Result<std::collections::HashMap<String, met_lightning::Strike>>>,
) -> (
    LightningEventManager<Arc<FakeProvider>, Arc<RecordingRegistrar>>,
    Arc<FakeProvider>,
    Arc<RecordingRegistrar>,
) {
    let provider = Arc::new(FakeProvider::new(script));
    let registrar = Arc::new(RecordingRegistrar::default());
    let manager = LightningEventManager::new(
        Arc::clone(&provider),
        Arc::clone(&registrar),
        59.9139,
        10.7522,
        50.0,
    );
    (manager, provider, registrar)
}

fn id_set(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn appear_grow_shrink() {
    let (mut manager, _provider, registrar) = manager(vec![
        Ok(strikes(&[("S1", 1000.0)])),
        Ok(strikes(&[("S1", 1000.0), ("S2", 2000.0)])),
        Ok(strikes(&[("S2", 2000.0)])),
    ]);

    let first = manager.update().await.unwrap();
    assert_eq!(first.created, vec!["S1"]);
    assert!(first.removed.is_empty());
    assert_eq!(manager.managed_strike_ids(), &id_set(&["S1"]));

    let second = manager.update().await.unwrap();
    assert_eq!(second.created, vec!["S2"]);
    assert!(second.removed.is_empty());
    assert_eq!(manager.managed_strike_ids(), &id_set(&["S1", "S2"]));

    let third = manager.update().await.unwrap();
    assert!(third.created.is_empty());
    assert_eq!(third.removed, vec!["S1"]);
    assert_eq!(manager.managed_strike_ids(), &id_set(&["S2"]));

    assert_eq!(
        registrar.batches(),
        vec![vec!["S1".to_string()], vec!["S2".to_string()], vec![]]
    );
    assert_eq!(registrar.removals(), vec!["S1"]);
    assert_eq!(registrar.registry.ids(), vec!["S2"]);
}

#[tokio::test]
async fn identical_responses_are_idempotent() {
    let feed = strikes(&[("A", 500.0), ("B", 700.0)]);
    let (mut manager, _provider, registrar) = manager(vec![Ok(feed.clone()), Ok(feed)]);

    let first = manager.update().await.unwrap();
    assert_eq!(first.created.len(), 2);

    let second = manager.update().await.unwrap();
    assert!(second.is_noop());
    assert_eq!(registrar.batches()[1], Vec::<String>::new());
    assert!(registrar.removals().is_empty());
    assert_eq!(registrar.registry.len(), 2);
}

#[tokio::test]
async fn failed_fetch_contributes_nothing() {
    let (mut manager, _provider, registrar) = manager(vec![
        Ok(strikes(&[("A", 1.0), ("B", 2.0)])),
        fetch_error(),
        Ok(strikes(&[("B", 2.0), ("C", 3.0)])),
    ]);

    manager.update().await.unwrap();
    assert!(manager.update().await.is_err());
    assert_eq!(manager.managed_strike_ids(), &id_set(&["A", "B"]));
    assert_eq!(registrar.batches().len(), 1);

    let third = manager.update().await.unwrap();
    assert_eq!(third.removed, vec!["A"]);
    assert_eq!(third.created, vec!["C"]);
    assert_eq!(registrar.registry.ids(), vec!["B", "C"]);
}

#[tokio::test]
async fn known_set_tracks_last_successful_fetch() {
    let script = vec![
        Ok(strikes(&[("A", 1.0)])),
        Ok(strikes(&[("B", 1.0), ("C", 1.0), ("D", 1.0)])),
        fetch_error(),
        Ok(strikes(&[])),
        Ok(strikes(&[("D", 1.0), ("E", 1.0)])),
    ];
    let expected = [
        Some(id_set(&["A"])),
        Some(id_set(&["B", "C", "D"])),
        None,
        Some(id_set(&[])),
        Some(id_set(&["D", "E"])),
    ];
    let (mut manager, _provider, registrar) = manager(script);

    let mut last_ok = HashSet::new();
    for want in expected {
        let result = manager.update().await;
        if let Some(ids) = want {
            assert!(result.is_ok());
            last_ok = ids;
        } else {
            assert!(result.is_err());
        }
        assert_eq!(manager.managed_strike_ids(), &last_ok);
        let live: HashSet<String> = registrar.registry.ids().into_iter().collect();
        assert_eq!(live, last_ok);
    }
}

#[tokio::test]
async fn events_carry_converted_distance() {
    let (mut manager, _provider, registrar) = manager(vec![Ok(strikes(&[("S1", 12345.0)]))]);
    manager.update().await.unwrap();

    let event = registrar.registry.get("S1").unwrap();
    assert!((event.distance() - 12.345).abs() < 1e-9);
    assert_eq!(event.unit_of_measurement(), "km");
    assert_eq!(event.name(), "Lightning Strike: S1");
    assert_eq!(event.attachment(), Attachment::Attached);
    assert_eq!(event.attributes()["publication_date"], "2023-10-17T14:03:21.000Z");
}

#[tokio::test]
async fn provider_receives_origin_and_scaled_radius() {
    let (mut manager, provider, _registrar) = manager(vec![Ok(strikes(&[]))]);
    manager.update().await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let (lat, lon, radius) = requests[0];
    assert!((lat - 59.9139).abs() < 1e-9);
    assert!((lon - 10.7522).abs() < 1e-9);
    assert_eq!(radius, 50.0 * RADIUS_SCALE);
}
