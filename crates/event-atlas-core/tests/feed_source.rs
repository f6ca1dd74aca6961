// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use event_atlas_core::{AtlasError, EventSession, FeedSource, LoadStatus};
use simplelog::{Config, LevelFilter, TestLogger};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::tempdir;

const FEED: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature", "geometry": { "type": "Point", "coordinates": [43.5, 12.1] },
          "properties": { "title*": "Approach by skiff", "category *": "Suspicious approach" } },
        { "type": "Feature", "geometry": { "type": "Point", "coordinates": [3.4, 6.4] },
          "properties": { "title": "Crew kidnapped", "category": "Kidnapping", "country": "Nigeria" } }
    ]
}"#;

fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

/// Serves exactly one HTTP response on a loopback port and returns its URL.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/geo+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{}/events.geojson", addr)
}

#[test]
fn test_http_failure_reports_generic_error() {
    init_logging();
    let url = serve_once("503 Service Unavailable", "");
    let source = FeedSource::parse(&url);
    assert!(matches!(
        source.fetch(),
        Err(AtlasError::FeedUnavailable(_))
    ));

    let url = serve_once("500 Internal Server Error", "oops");
    let mut session: EventSession = EventSession::new(true);
    let status = session.load(&FeedSource::parse(&url));

    assert_eq!(status, LoadStatus::Failed);
    assert_eq!(session.status().to_string(), "Error loading events (see console)");
    assert!(session.registry().all_categories().is_empty());
    assert_eq!(session.visible_count(), 0);
}

#[test]
fn test_http_success_loads_events() {
    init_logging();
    let url = serve_once("200 OK", FEED);
    let mut session: EventSession = EventSession::new(false);
    let status = session.load(&FeedSource::parse(&url));

    assert_eq!(status, LoadStatus::Loaded(2));
    assert_eq!(
        session.registry().all_categories(),
        vec!["Kidnapping", "Suspicious approach"]
    );
    assert_eq!(session.events()[0].title, "Approach by skiff");
}

#[test]
fn test_file_source_load_and_missing_file() {
    init_logging();
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.geojson");
    std::fs::write(&path, FEED).unwrap();

    let mut session: EventSession = EventSession::new(true);
    assert_eq!(
        session.load(&FeedSource::Path(path)),
        LoadStatus::Loaded(2)
    );
    assert_eq!(session.panel().rows[0].id, "cat-kidnapping");
    assert_eq!(session.panel().rows[1].icon, Some("suspicious_approach.png"));

    let status = session.load(&FeedSource::Path(dir.path().join("missing.geojson")));
    assert_eq!(status, LoadStatus::Failed);
    assert!(session.events().is_empty());
}
