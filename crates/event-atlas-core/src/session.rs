// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::feed::{self, Event, FeedDocument, SkippedRecord};
use crate::geo::BoundingBox;
use crate::panel::FilterPanel;
use crate::registry::CategoryRegistry;
use crate::source::FeedSource;
use crate::surface::{LayerStore, MapSurface, Popup};
use crate::visibility::{VisibilityChange, VisibilityCoordinator};
use crate::AtlasError;
use chrono::NaiveDate;
use log::{error, info};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded(usize),
    Failed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loading => write!(f, "Loading events…"),
            LoadStatus::Loaded(n) => write!(f, "Loaded {} events", n),
            LoadStatus::Failed => write!(f, "Error loading events (see console)"),
        }
    }
}

/// Everything one page load owns: the ingested events, the category
/// registry, the coordinator (and through it the map surface) and the
/// filter panel. Toggles are ignored until a load has succeeded.
pub struct EventSession<S: MapSurface = LayerStore> {
    status: LoadStatus,
    events: Vec<Event>,
    skipped: Vec<SkippedRecord>,
    registry: CategoryRegistry,
    coordinator: VisibilityCoordinator<S>,
    panel: FilterPanel,
    show_icons: bool,
}

impl<S: MapSurface + Default> Default for EventSession<S> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<S: MapSurface + Default> EventSession<S> {
    pub fn new(show_icons: bool) -> Self {
        Self {
            status: LoadStatus::Loading,
            events: Vec::new(),
            skipped: Vec::new(),
            registry: CategoryRegistry::new(),
            coordinator: VisibilityCoordinator::new(S::default()),
            panel: FilterPanel::default(),
            show_icons,
        }
    }

    /// Drops any previous load and goes back to `Loading`.
    pub fn begin_load(&mut self) {
        *self = Self::new(self.show_icons);
    }

    /// Blocking fetch + ingest in one call (CLI path).
    pub fn load(&mut self, source: &FeedSource) -> LoadStatus {
        self.begin_load();
        info!("Loading events — source={}", source);
        self.finish_load(source.fetch())
    }

    /// Completes a load with the fetched body, or the fetch error. Failures
    /// are logged in full and collapse to the generic `Failed` status.
    pub fn finish_load(&mut self, fetched: Result<Vec<u8>, AtlasError>) -> LoadStatus {
        if self.status != LoadStatus::Loading {
            self.begin_load();
        }
        match fetched.and_then(|bytes| self.ingest_bytes(&bytes)) {
            Ok(n) => {
                self.status = LoadStatus::Loaded(n);
                info!(
                    "Events loaded — events={} skipped={} categories={}",
                    n,
                    self.skipped.len(),
                    self.registry.len()
                );
            }
            Err(e) => {
                error!("Error loading events: {}", e);
                *self = Self::new(self.show_icons);
                self.status = LoadStatus::Failed;
            }
        }
        self.status
    }

    fn ingest_bytes(&mut self, bytes: &[u8]) -> Result<usize, AtlasError> {
        let doc = FeedDocument::from_slice(bytes)?;
        let ingested = feed::ingest(&doc, &mut self.registry, self.coordinator.surface_mut())?;
        self.events = ingested.events;
        self.skipped = ingested.skipped;
        // Registry is complete: only now may the panel exist
        self.panel = FilterPanel::build(&self.registry, &self.coordinator, self.show_icons);
        Ok(self.events.len())
    }
}

impl<S: MapSurface> EventSession<S> {
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded(_))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &VisibilityCoordinator<S> {
        &self.coordinator
    }

    pub fn panel(&self) -> &FilterPanel {
        &self.panel
    }

    pub fn visible_count(&self) -> usize {
        self.coordinator.visible_count(&self.registry)
    }

    /// Checkbox change for a panel row.
    pub fn toggle_row(&mut self, row_id: &str, checked: bool) -> Option<VisibilityChange> {
        if !self.is_loaded() {
            return None;
        }
        self.panel
            .toggle(row_id, checked, &self.registry, &mut self.coordinator)
    }

    /// Same path as a checkbox change, addressed by category name.
    pub fn set_category_visible(
        &mut self,
        category: &str,
        visible: bool,
    ) -> Option<VisibilityChange> {
        if !self.is_loaded() {
            return None;
        }
        let change = self
            .coordinator
            .set_category_visible(&self.registry, category, visible);
        self.panel.apply(&change);
        Some(change)
    }

    pub fn select_all(&mut self) -> usize {
        self.set_all_visible(true)
    }

    pub fn select_none(&mut self) -> usize {
        self.set_all_visible(false)
    }

    fn set_all_visible(&mut self, visible: bool) -> usize {
        if self.is_loaded() {
            let changes = self.coordinator.set_all_visible(&self.registry, visible);
            self.panel.apply_all(&changes);
        }
        self.visible_count()
    }

    /// Extent to fit for "zoom to visible"; `None` leaves the view alone.
    pub fn zoom_target(&self) -> Option<BoundingBox> {
        self.coordinator.visible_markers_bounds(&self.registry)
    }

    pub fn event(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn popup(&self, index: usize) -> Option<Popup> {
        self.event(index).map(Popup::for_event)
    }

    pub fn events_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.category == category)
    }

    /// Earliest and latest parseable event dates.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.events.iter().filter_map(Event::parsed_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
