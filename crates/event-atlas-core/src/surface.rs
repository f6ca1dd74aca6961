// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::feed::Event;
use crate::geo::{BoundingBox, LatLon};

/// Opaque handle to a layer group owned by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// Detail payload shown when a marker is inspected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Popup {
    pub title: String,
    pub category: String,
    pub date: String,
    pub country: String,
    pub description: String,
    pub geocode_confidence: String,
    pub geocode_method: String,
}

impl Popup {
    pub fn for_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            category: event.category.clone(),
            date: event.date.clone(),
            country: event.country.clone(),
            description: event.description.clone(),
            geocode_confidence: event.geocode_confidence.clone(),
            geocode_method: event.geocode_method.clone(),
        }
    }

    fn geocode_line(&self) -> Option<String> {
        match (
            self.geocode_confidence.is_empty(),
            self.geocode_method.is_empty(),
        ) {
            (true, true) => None,
            (false, true) => Some(format!("Geocode: {}", self.geocode_confidence)),
            (true, false) => Some(format!("Geocode: {}", self.geocode_method)),
            (false, false) => Some(format!(
                "Geocode: {} ({})",
                self.geocode_confidence, self.geocode_method
            )),
        }
    }

    /// Plain label/value lines, empty optional fields omitted.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone(), format!("Category: {}", self.category)];
        if !self.date.is_empty() {
            lines.push(format!("Date: {}", self.date));
        }
        if !self.country.is_empty() {
            lines.push(format!("Country: {}", self.country));
        }
        if !self.description.is_empty() {
            lines.push(self.description.clone());
        }
        if let Some(geo) = self.geocode_line() {
            lines.push(geo);
        }
        lines
    }

    /// HTML fragment for web-style popups. Every value is escaped.
    pub fn to_html(&self) -> String {
        let esc = |s: &str| html_escape::encode_text(s).into_owned();

        let mut html = format!("<strong>{}</strong><br>", esc(&self.title));
        html.push_str(&format!("<em>{}</em>", esc(&self.category)));
        if !self.date.is_empty() {
            html.push_str(&format!("<br>Date: {}", esc(&self.date)));
        }
        if !self.country.is_empty() {
            html.push_str(&format!("<br>Country: {}", esc(&self.country)));
        }
        if !self.description.is_empty() {
            html.push_str(&format!("<p>{}</p>", esc(&self.description)));
        }
        if let Some(geo) = self.geocode_line() {
            html.push_str(&format!("<small>{}</small>", esc(&geo)));
        }
        html
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLon,
    /// Index of the source event in the ingested sequence.
    pub event_index: usize,
    pub popup: Popup,
}

impl Marker {
    pub fn for_event(event_index: usize, event: &Event) -> Self {
        Self {
            position: event.position,
            event_index,
            popup: Popup::for_event(event),
        }
    }
}

/// The mapping widget's layer primitives.
///
/// Attach/detach are idempotent: attaching an attached layer (or detaching a
/// detached one) has no observable effect.
pub trait MapSurface {
    fn create_layer(&mut self) -> LayerId;
    fn add_marker(&mut self, layer: LayerId, marker: Marker);
    fn attach_layer(&mut self, layer: LayerId);
    fn detach_layer(&mut self, layer: LayerId);
    fn is_attached(&self, layer: LayerId) -> bool;
    fn markers(&self, layer: LayerId) -> &[Marker];

    /// Extent of every marker in the layer, `None` for an empty or unknown layer.
    fn layer_bounds(&self, layer: LayerId) -> Option<BoundingBox> {
        BoundingBox::from_points(self.markers(layer).iter().map(|m| m.position))
    }
}

#[derive(Debug, Default)]
struct LayerGroup {
    markers: Vec<Marker>,
    attached: bool,
}

/// In-memory layer groups backing both binaries.
#[derive(Debug, Default)]
pub struct LayerStore {
    layers: Vec<LayerGroup>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

}

impl MapSurface for LayerStore {
    fn create_layer(&mut self) -> LayerId {
        self.layers.push(LayerGroup::default());
        LayerId(self.layers.len() - 1)
    }

    fn add_marker(&mut self, layer: LayerId, marker: Marker) {
        match self.layers.get_mut(layer.0) {
            Some(group) => group.markers.push(marker),
            None => log::warn!("Marker dropped for unknown layer — layer={}", layer.0),
        }
    }

    fn attach_layer(&mut self, layer: LayerId) {
        if let Some(group) = self.layers.get_mut(layer.0) {
            group.attached = true;
        }
    }

    fn detach_layer(&mut self, layer: LayerId) {
        if let Some(group) = self.layers.get_mut(layer.0) {
            group.attached = false;
        }
    }

    fn is_attached(&self, layer: LayerId) -> bool {
        self.layers.get(layer.0).is_some_and(|g| g.attached)
    }

    fn markers(&self, layer: LayerId) -> &[Marker] {
        self.layers
            .get(layer.0)
            .map(|g| g.markers.as_slice())
            .unwrap_or(&[])
    }
}
