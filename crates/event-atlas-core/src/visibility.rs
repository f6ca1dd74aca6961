// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::BoundingBox;
use crate::properties::normalize_category;
use crate::registry::CategoryRegistry;
use crate::surface::{LayerId, MapSurface, Marker};
use log::{debug, warn};

/// Published after every single-category toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChange {
    pub category: String,
    /// Layer state after the toggle.
    pub visible: bool,
    pub visible_total: usize,
}

/// Shows and hides category layers on the surface it owns.
///
/// Holds no counters of its own: the visible total is recomputed from the
/// registry and the surface's attach state on every query.
pub struct VisibilityCoordinator<S: MapSurface> {
    surface: S,
}

impl<S: MapSurface> VisibilityCoordinator<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn set_category_visible(
        &mut self,
        registry: &CategoryRegistry,
        category: &str,
        visible: bool,
    ) -> VisibilityChange {
        let visible = match registry.layer_of(category) {
            Some(layer) => {
                if visible {
                    self.surface.attach_layer(layer);
                } else {
                    self.surface.detach_layer(layer);
                }
                self.surface.is_attached(layer)
            }
            None => {
                warn!("Toggle for unknown category ignored — category={:?}", category);
                false
            }
        };

        let visible_total = self.visible_count(registry);
        debug!(
            "Category visibility set — category={:?} visible={} visible_total={}",
            category, visible, visible_total
        );
        VisibilityChange {
            category: normalize_category(category),
            visible,
            visible_total,
        }
    }

    /// One individual toggle per category, in display order.
    pub fn set_all_visible(
        &mut self,
        registry: &CategoryRegistry,
        visible: bool,
    ) -> Vec<VisibilityChange> {
        registry
            .all_categories()
            .iter()
            .map(|category| self.set_category_visible(registry, category, visible))
            .collect()
    }

    pub fn is_visible(&self, registry: &CategoryRegistry, category: &str) -> bool {
        registry
            .layer_of(category)
            .is_some_and(|layer| self.surface.is_attached(layer))
    }

    /// Sum of counts over attached layers. Linear in the category count.
    pub fn visible_count(&self, registry: &CategoryRegistry) -> usize {
        registry
            .entries()
            .filter(|(_, entry)| self.surface.is_attached(entry.layer))
            .map(|(_, entry)| entry.count)
            .sum()
    }

    /// Markers of every attached category layer with their layer, in
    /// display order. Renderers draw from this.
    pub fn visible_markers<'a>(
        &'a self,
        registry: &CategoryRegistry,
    ) -> impl Iterator<Item = (LayerId, &'a Marker)> + 'a {
        let layers: Vec<_> = registry
            .all_categories()
            .iter()
            .filter_map(|c| registry.layer_of(c))
            .filter(|layer| self.surface.is_attached(*layer))
            .collect();
        layers
            .into_iter()
            .flat_map(move |layer| {
                self.surface
                    .markers(layer)
                    .iter()
                    .map(move |m| (layer, m))
            })
    }

    /// `None` when nothing is visible; callers must not fit the view then.
    pub fn visible_markers_bounds(&self, registry: &CategoryRegistry) -> Option<BoundingBox> {
        registry
            .all_categories()
            .iter()
            .filter_map(|c| registry.layer_of(c))
            .filter(|layer| self.surface.is_attached(*layer))
            .filter_map(|layer| self.surface.layer_bounds(layer))
            .reduce(|acc, b| acc.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLon;
    use crate::surface::{LayerStore, Popup};

    fn setup() -> (CategoryRegistry, VisibilityCoordinator<LayerStore>) {
        let mut store = LayerStore::new();
        let mut reg = CategoryRegistry::new();
        let placements = [
            ("Piracy", 10.0, 20.0),
            ("Piracy", -5.0, 45.0),
            ("Smuggling", 30.0, -10.0),
            ("Kidnapping", 4.0, 7.0),
        ];
        for (i, (cat, lat, lon)) in placements.into_iter().enumerate() {
            let layer = reg.increment(cat, &mut store).layer;
            store.add_marker(
                layer,
                Marker {
                    position: LatLon::new(lat, lon),
                    event_index: i,
                    popup: Popup::default(),
                },
            );
        }
        (reg, VisibilityCoordinator::new(store))
    }

    #[test]
    fn test_all_visible_after_load() {
        let (reg, coord) = setup();
        assert_eq!(coord.visible_count(&reg), 4);
        for c in reg.all_categories() {
            assert!(coord.is_visible(&reg, &c));
        }
    }

    #[test]
    fn test_set_all_visible_totals() {
        let (reg, mut coord) = setup();

        let changes = coord.set_all_visible(&reg, false);
        assert_eq!(coord.visible_count(&reg), 0);
        let order: Vec<&str> = changes.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["Kidnapping", "Piracy", "Smuggling"]);
        // Each step publishes the running total
        let totals: Vec<usize> = changes.iter().map(|c| c.visible_total).collect();
        assert_eq!(totals, vec![3, 1, 0]);

        coord.set_all_visible(&reg, true);
        assert_eq!(coord.visible_count(&reg), 4);
    }

    #[test]
    fn test_toggle_round_trip_and_idempotence() {
        let (reg, mut coord) = setup();
        let before = coord.visible_count(&reg);

        let off = coord.set_category_visible(&reg, "Piracy", false);
        assert!(!off.visible);
        assert_eq!(off.visible_total, 2);
        // Hiding twice changes nothing
        let again = coord.set_category_visible(&reg, "Piracy", false);
        assert_eq!(again, off);

        let on = coord.set_category_visible(&reg, "Piracy", true);
        assert!(on.visible);
        assert_eq!(on.visible_total, before);
        assert_eq!(coord.visible_count(&reg), before);
    }

    #[test]
    fn test_unknown_category_toggle() {
        let (reg, mut coord) = setup();
        let change = coord.set_category_visible(&reg, "Hijacking", true);
        assert!(!change.visible);
        assert_eq!(change.visible_total, 4);
    }

    #[test]
    fn test_visible_bounds() {
        let (reg, mut coord) = setup();
        assert_eq!(
            coord.visible_markers_bounds(&reg),
            Some(BoundingBox::new(-5.0, 30.0, -10.0, 45.0))
        );

        coord.set_category_visible(&reg, "Smuggling", false);
        assert_eq!(
            coord.visible_markers_bounds(&reg),
            Some(BoundingBox::new(-5.0, 10.0, 7.0, 45.0))
        );
        assert_eq!(coord.visible_markers(&reg).count(), 3);
        let smuggling = reg.layer_of("Smuggling");
        assert!(coord
            .visible_markers(&reg)
            .all(|(layer, _)| Some(layer) != smuggling));

        coord.set_all_visible(&reg, false);
        assert_eq!(coord.visible_markers_bounds(&reg), None);
        assert_eq!(coord.visible_markers(&reg).count(), 0);
    }
}
