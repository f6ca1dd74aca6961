// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::icons;
use crate::registry::CategoryRegistry;
use crate::surface::MapSurface;
use crate::visibility::{VisibilityChange, VisibilityCoordinator};
use log::warn;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// One filter control: checkbox + label + live count.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlRow {
    pub id: String,
    pub label: String,
    pub count: usize,
    pub checked: bool,
    pub icon: Option<&'static str>,
}

/// The rows of the filter panel plus the visible-count readout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPanel {
    pub rows: Vec<ControlRow>,
    pub visible_total: usize,
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"))
}

/// `"Armed Robbery / Theft"` -> `"cat-armed-robbery-theft"`.
pub fn row_id(category: &str) -> String {
    let lower = category.to_lowercase();
    let slug = separator_runs().replace_all(&lower, "-");
    format!("cat-{}", slug.trim_matches('-'))
}

impl FilterPanel {
    /// Fresh rows for every registered category. Replaces whatever panel the
    /// caller held before.
    pub fn build<S: MapSurface>(
        registry: &CategoryRegistry,
        coordinator: &VisibilityCoordinator<S>,
        show_icons: bool,
    ) -> Self {
        // Every id handed out so far, suffixed ones included
        let mut used: HashSet<String> = HashSet::new();
        let rows = registry
            .all_categories()
            .into_iter()
            .map(|category| {
                let base = row_id(&category);
                let mut id = base.clone();
                let mut n = 1;
                while used.contains(&id) {
                    n += 1;
                    id = format!("{base}-{n}");
                }
                if n > 1 {
                    warn!(
                        "Filter id collision — category={:?} id={} suffix={}",
                        category, base, n
                    );
                }
                used.insert(id.clone());

                ControlRow {
                    id,
                    count: registry.count_of(&category),
                    // Freshly loaded layers are all attached, so this starts out true
                    checked: coordinator.is_visible(registry, &category),
                    icon: show_icons.then(|| icons::icon_for(&category)),
                    label: category,
                }
            })
            .collect();

        Self {
            rows,
            visible_total: coordinator.visible_count(registry),
        }
    }

    pub fn row(&self, id: &str) -> Option<&ControlRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Checkbox handler: routes the new state through the coordinator and
    /// applies the published change. Returns `None` for an unknown row id.
    pub fn toggle<S: MapSurface>(
        &mut self,
        id: &str,
        checked: bool,
        registry: &CategoryRegistry,
        coordinator: &mut VisibilityCoordinator<S>,
    ) -> Option<VisibilityChange> {
        let category = self.row(id)?.label.clone();
        let change = coordinator.set_category_visible(registry, &category, checked);
        self.apply(&change);
        Some(change)
    }

    /// Syncs the matching checkbox and the readout with a published change.
    pub fn apply(&mut self, change: &VisibilityChange) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.label == change.category) {
            row.checked = change.visible;
        }
        self.visible_total = change.visible_total;
    }

    pub fn apply_all(&mut self, changes: &[VisibilityChange]) {
        for change in changes {
            self.apply(change);
        }
    }
}
