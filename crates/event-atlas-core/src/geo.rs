// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

/// A WGS84 position in the internal (lat, lon) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a position from the feed's `[lon, lat]` order.
    /// Returns `None` when either component is non-finite or out of range.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Option<Self> {
        let pos = Self { lat, lon };
        pos.is_valid().then_some(pos)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Degenerate box around a single marker.
    pub fn from_point(pos: LatLon) -> Self {
        Self::new(pos.lat, pos.lat, pos.lon, pos.lon)
    }

    /// Smallest box covering every position, `None` for an empty input.
    pub fn from_points<I: IntoIterator<Item = LatLon>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(first);
        for pos in iter {
            bounds.extend(pos);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, pos: LatLon) {
        self.min_lat = self.min_lat.min(pos.lat);
        self.max_lat = self.max_lat.max(pos.lat);
        self.min_lon = self.min_lon.min(pos.lon);
        self.max_lon = self.max_lon.max(pos.lon);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// True when the box collapses to a single point (one visible marker).
    pub fn is_point(&self) -> bool {
        self.min_lat == self.max_lat && self.min_lon == self.max_lon
    }
}
