// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::LatLon;
use crate::properties::{self, RawRecord};
use crate::registry::CategoryRegistry;
use crate::surface::{MapSurface, Marker};
use crate::AtlasError;
use chrono::NaiveDate;
use log::{debug, info};
use serde_json::Value;
use std::fmt;

/// A validated point event. Immutable once ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Zero-based index of the source feature in the feed.
    pub index: usize,
    pub position: LatLon,
    pub title: String,
    pub category: String,
    pub date: String,
    pub country: String,
    pub description: String,
    pub geocode_confidence: String,
    pub geocode_method: String,
}

impl Event {
    fn from_properties(index: usize, position: LatLon, props: &RawRecord) -> Self {
        use properties::*;

        Self {
            index,
            position,
            title: resolve(props, TITLE_KEYS, UNTITLED),
            category: resolve_category(props),
            date: resolve(props, DATE_KEYS, ""),
            country: resolve(props, COUNTRY_KEYS, ""),
            description: resolve(props, DESCRIPTION_KEYS, ""),
            geocode_confidence: resolve(props, GEOCODE_CONFIDENCE_KEYS, ""),
            geocode_method: resolve(props, GEOCODE_METHOD_KEYS, ""),
        }
    }

    /// Best-effort calendar date. Partial dates resolve to the first day.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();
        if raw.is_empty() {
            return None;
        }
        // Timestamps like "2023-04-01T10:00:00Z" keep only the date part
        let raw = raw.split('T').next().unwrap_or(raw);

        for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
            if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
                return Some(d);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
            return Some(d);
        }
        if raw.len() == 4 {
            if let Ok(year) = raw.parse::<i32>() {
                return NaiveDate::from_ymd_opt(year, 1, 1);
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotAFeature,
    MissingGeometry,
    NotAPoint(String),
    BadCoordinates,
    OutOfRange { lat: f64, lon: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAFeature => write!(f, "record is not a Feature"),
            SkipReason::MissingGeometry => write!(f, "geometry missing"),
            SkipReason::NotAPoint(kind) => write!(f, "geometry type {kind:?} is not Point"),
            SkipReason::BadCoordinates => write!(f, "coordinates are not a numeric pair"),
            SkipReason::OutOfRange { lat, lon } => {
                write!(f, "coordinates out of range (lat={lat}, lon={lon})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: SkipReason,
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedRecord>,
}

/// Parsed but not yet validated feed body.
#[derive(Debug, Clone)]
pub struct FeedDocument(Value);

impl FeedDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AtlasError> {
        serde_json::from_slice(bytes)
            .map(Self)
            .map_err(|e| AtlasError::MalformedFeed(format!("body is not JSON: {e}")))
    }

    /// The ordered feature records, once the top-level shape checks out.
    fn features(&self) -> Result<&[Value], AtlasError> {
        let obj = self
            .0
            .as_object()
            .ok_or_else(|| AtlasError::MalformedFeed("top level is not an object".into()))?;

        match obj.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {}
            Some(other) => {
                return Err(AtlasError::MalformedFeed(format!(
                    "expected FeatureCollection, found {other:?}"
                )))
            }
            None => return Err(AtlasError::MalformedFeed("missing type discriminator".into())),
        }

        obj.get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| AtlasError::MalformedFeed("features is not an array".into()))
    }
}

fn parse_feature(index: usize, feature: &Value) -> Result<Event, SkipReason> {
    if feature.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(SkipReason::NotAFeature);
    }

    let geometry = feature
        .get("geometry")
        .filter(|g| g.is_object())
        .ok_or(SkipReason::MissingGeometry)?;

    match geometry.get("type").and_then(Value::as_str) {
        Some("Point") => {}
        other => {
            return Err(SkipReason::NotAPoint(
                other.unwrap_or_default().to_string(),
            ))
        }
    }

    let coords = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or(SkipReason::BadCoordinates)?;
    let (lon, lat) = match coords.as_slice() {
        [lon, lat] => (
            lon.as_f64().ok_or(SkipReason::BadCoordinates)?,
            lat.as_f64().ok_or(SkipReason::BadCoordinates)?,
        ),
        _ => return Err(SkipReason::BadCoordinates),
    };
    let position = LatLon::from_lon_lat(lon, lat).ok_or(SkipReason::OutOfRange { lat, lon })?;

    let empty = RawRecord::new();
    let props = feature
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(Event::from_properties(index, position, props))
}

/// Validates every feature without touching any registry.
/// Only a broken top-level shape is an error; bad features are skipped.
pub fn parse_feed(doc: &FeedDocument) -> Result<Ingested, AtlasError> {
    let features = doc.features()?;
    let mut out = Ingested {
        events: Vec::with_capacity(features.len()),
        skipped: Vec::new(),
    };

    for (index, feature) in features.iter().enumerate() {
        match parse_feature(index, feature) {
            Ok(event) => out.events.push(event),
            Err(reason) => {
                debug!("Skipping feature — index={} reason={}", index, reason);
                out.skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    info!(
        "Feed parsed — features={} kept={} skipped={}",
        features.len(),
        out.events.len(),
        out.skipped.len()
    );
    Ok(out)
}

/// Parses the feed, registers every event's category and drops a marker
/// into the category layer.
pub fn ingest<S: MapSurface>(
    doc: &FeedDocument,
    registry: &mut CategoryRegistry,
    surface: &mut S,
) -> Result<Ingested, AtlasError> {
    let ingested = parse_feed(doc)?;

    for (i, event) in ingested.events.iter().enumerate() {
        let layer = registry.increment(&event.category, surface).layer;
        surface.add_marker(layer, Marker::for_event(i, event));
    }

    debug!(
        "Ingestion registered categories — categories={} events={}",
        registry.len(),
        ingested.events.len()
    );
    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(lon: f64, lat: f64, props: Value) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [lon, lat] },
            "properties": props,
        })
    }

    #[test]
    fn test_top_level_shape_is_fatal() {
        for bad in [
            json!([]),
            json!({ "features": [] }),
            json!({ "type": "Feature", "features": [] }),
            json!({ "type": "FeatureCollection" }),
            json!({ "type": "FeatureCollection", "features": {} }),
        ] {
            let res = parse_feed(&FeedDocument::new(bad.clone()));
            assert!(
                matches!(res, Err(AtlasError::MalformedFeed(_))),
                "expected MalformedFeed for {bad}"
            );
        }

        assert!(matches!(
            FeedDocument::from_slice(b"<html>oops</html>"),
            Err(AtlasError::MalformedFeed(_))
        ));
    }

    #[test]
    fn test_skip_conditions() {
        let doc = FeedDocument::new(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Thing", "geometry": { "type": "Point", "coordinates": [1, 2] } },
                { "type": "Feature", "properties": {} },
                { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1] } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1, 2, 3] } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": ["1", 2] } },
                { "type": "Feature", "geometry": { "type": "Point" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [200, 10] } },
                point(5.0, 6.0, json!({ "title": "kept" })),
            ]
        }));

        let out = parse_feed(&doc).unwrap();
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].index, 8);
        assert_eq!(out.events.len() + out.skipped.len(), 9);

        let reasons: Vec<SkipReason> = out.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::NotAFeature,
                SkipReason::MissingGeometry,
                SkipReason::NotAPoint("LineString".into()),
                SkipReason::BadCoordinates,
                SkipReason::BadCoordinates,
                SkipReason::BadCoordinates,
                SkipReason::BadCoordinates,
                SkipReason::OutOfRange {
                    lat: 10.0,
                    lon: 200.0
                },
            ]
        );
    }

    #[test]
    fn test_fields_resolved_with_defaults() {
        let doc = FeedDocument::new(json!({
            "type": "FeatureCollection",
            "features": [
                point(20.0, 10.0, json!({
                    "title*": "Boarding",
                    "category *": "Piracy",
                    "description*": "Two skiffs approached",
                    "geocode_confidence": "high",
                    "geocode_method": "port",
                })),
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 0] } },
            ]
        }));

        let out = parse_feed(&doc).unwrap();
        let e = &out.events[0];
        assert_eq!(e.position, LatLon::new(10.0, 20.0));
        assert_eq!(e.title, "Boarding");
        assert_eq!(e.category, "Piracy");
        assert_eq!(e.description, "Two skiffs approached");
        assert_eq!(e.geocode_confidence, "high");
        assert_eq!(e.geocode_method, "port");
        assert_eq!(e.date, "");

        // No properties object at all
        let e = &out.events[1];
        assert_eq!(e.title, properties::UNTITLED);
        assert_eq!(e.category, properties::UNCATEGORISED);
        assert_eq!(e.country, "");
    }

    #[test]
    fn test_parsed_date_formats() {
        let mut e = parse_feed(&FeedDocument::new(json!({
            "type": "FeatureCollection",
            "features": [point(0.0, 0.0, json!({}))]
        })))
        .unwrap()
        .events
        .remove(0);

        assert_eq!(e.parsed_date(), None);
        for (raw, expected) in [
            ("2023-04-01", (2023, 4, 1)),
            ("2023-04-01T10:00:00Z", (2023, 4, 1)),
            ("01/04/2023", (2023, 4, 1)),
            ("2023-04", (2023, 4, 1)),
            ("2019", (2019, 1, 1)),
        ] {
            e.date = raw.to_string();
            let (y, m, d) = expected;
            assert_eq!(e.parsed_date(), NaiveDate::from_ymd_opt(y, m, d), "{raw}");
        }
        e.date = "last Tuesday".into();
        assert_eq!(e.parsed_date(), None);
    }
}
