// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use event_atlas_core::feed::{ingest, parse_feed, FeedDocument};
use event_atlas_core::{
    CategoryRegistry, EventSession, LatLon, LayerStore, LoadStatus, MapSurface,
    VisibilityCoordinator,
};
use serde_json::{json, Value};

fn collection(features: Vec<Value>) -> FeedDocument {
    FeedDocument::new(json!({ "type": "FeatureCollection", "features": features }))
}

fn point(lon: f64, lat: f64, props: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [lon, lat] },
        "properties": props,
    })
}

#[test]
fn test_three_feature_scenario() {
    let doc = collection(vec![
        point(10.0, 20.0, json!({ "title": "Skiff sighted", "category": "Piracy" })),
        point(1.0, 2.0, json!({ "title": "No category here" })),
        json!({
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
            "properties": { "category": "Piracy" }
        }),
    ]);

    let mut store = LayerStore::new();
    let mut registry = CategoryRegistry::new();
    let out = ingest(&doc, &mut registry, &mut store).unwrap();

    assert_eq!(out.events.len(), 2);
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].index, 2);
    assert_eq!(registry.all_categories(), vec!["Piracy", "Uncategorised"]);
    assert_eq!(registry.count_of("Piracy"), 1);

    // Feed order is [lon, lat]
    assert_eq!(out.events[0].position, LatLon::new(20.0, 10.0));

    // One marker per event, in its category layer
    let piracy = registry.layer_of("Piracy").unwrap();
    assert_eq!(store.markers(piracy).len(), 1);
    assert_eq!(store.markers(piracy)[0].popup.title, "Skiff sighted");
}

#[test]
fn test_event_count_and_order_match_surviving_features() {
    let mut features = Vec::new();
    for i in 0..20 {
        if i % 4 == 3 {
            features.push(json!({ "type": "Feature", "geometry": { "type": "Point", "coordinates": [] } }));
        } else {
            features.push(point(i as f64, 0.0, json!({ "title": format!("event {i}") })));
        }
    }
    let out = parse_feed(&collection(features)).unwrap();

    assert_eq!(out.events.len(), 15);
    assert_eq!(out.events.len() + out.skipped.len(), 20);
    let indices: Vec<usize> = out.events.iter().map(|e| e.index).collect();
    let expected: Vec<usize> = (0..20).filter(|i| i % 4 != 3).collect();
    assert_eq!(indices, expected);
}

#[test]
fn test_duplicate_positions_are_kept() {
    let doc = collection(vec![
        point(5.0, 5.0, json!({ "title": "Same", "category": "Attack" })),
        point(5.0, 5.0, json!({ "title": "Same", "category": "Attack" })),
    ]);
    let out = parse_feed(&doc).unwrap();
    assert_eq!(out.events.len(), 2);
}

#[test]
fn test_whitespace_category_resolves_to_placeholder() {
    let doc = collection(vec![point(0.0, 0.0, json!({ "category": " " }))]);
    let out = parse_feed(&doc).unwrap();
    assert_eq!(out.events[0].category, "Uncategorised");
}

#[test]
fn test_starred_keys_are_fallbacks_only() {
    let doc = collection(vec![
        point(0.0, 0.0, json!({ "category": "Piracy", "category*": "Other" })),
        point(0.0, 0.0, json!({ "category": "", "category *": "Smuggling", "category*": "Other" })),
        point(0.0, 0.0, json!({ "category*": "Hijacking" })),
    ]);
    let out = parse_feed(&doc).unwrap();
    let cats: Vec<&str> = out.events.iter().map(|e| e.category.as_str()).collect();
    assert_eq!(cats, vec!["Piracy", "Smuggling", "Hijacking"]);
}

#[test]
fn test_visibility_totals_across_bulk_and_single_toggles() {
    let doc = collection(vec![
        point(1.0, 1.0, json!({ "category": "Piracy" })),
        point(2.0, 2.0, json!({ "category": "Piracy" })),
        point(3.0, 3.0, json!({ "category": "Kidnapping" })),
        point(4.0, 4.0, json!({ "category": "Smuggling" })),
        point(5.0, 5.0, json!({})),
    ]);
    let mut store = LayerStore::new();
    let mut registry = CategoryRegistry::new();
    ingest(&doc, &mut registry, &mut store).unwrap();
    let mut coordinator = VisibilityCoordinator::new(store);

    let sum: usize = registry
        .all_categories()
        .iter()
        .map(|c| registry.count_of(c))
        .sum();

    coordinator.set_all_visible(&registry, true);
    assert_eq!(coordinator.visible_count(&registry), sum);

    for category in registry.all_categories() {
        let before = coordinator.visible_count(&registry);
        coordinator.set_category_visible(&registry, &category, false);
        assert_eq!(
            coordinator.visible_count(&registry),
            before - registry.count_of(&category)
        );
        coordinator.set_category_visible(&registry, &category, true);
        assert_eq!(coordinator.visible_count(&registry), before);
    }

    coordinator.set_all_visible(&registry, false);
    assert_eq!(coordinator.visible_count(&registry), 0);
    assert!(coordinator.visible_markers_bounds(&registry).is_none());
}

#[test]
fn test_empty_feature_list_loads() {
    let mut session: EventSession = EventSession::new(true);
    let status = session.finish_load(Ok(br#"{"type":"FeatureCollection","features":[]}"#.to_vec()));

    assert_eq!(status, LoadStatus::Loaded(0));
    assert_eq!(status.to_string(), "Loaded 0 events");
    assert!(session.registry().all_categories().is_empty());
    assert!(session.panel().rows.is_empty());
    assert_eq!(session.visible_count(), 0);
}

#[test]
fn test_malformed_body_is_fatal() {
    let bodies: [&[u8]; 3] = [
        b"not json at all",
        br#"{"type":"Feature","features":[]}"#,
        br#"{"type":"FeatureCollection"}"#,
    ];
    for body in bodies {
        let mut session: EventSession = EventSession::new(true);
        let status = session.finish_load(Ok(body.to_vec()));
        assert_eq!(status, LoadStatus::Failed);
        assert_eq!(status.to_string(), "Error loading events (see console)");
        assert!(session.registry().is_empty());
    }
}
