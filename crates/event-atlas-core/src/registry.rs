// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::properties::normalize_category;
use crate::surface::{LayerId, MapSurface};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    pub count: usize,
    pub layer: LayerId,
}

/// Category name -> (event count, layer handle). Entries are created lazily
/// and never removed for the lifetime of a session.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    entries: HashMap<String, CategoryEntry>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut<S: MapSurface + ?Sized>(
        &mut self,
        category: &str,
        surface: &mut S,
    ) -> &mut CategoryEntry {
        let key = normalize_category(category);
        self.entries.entry(key).or_insert_with_key(|key| {
            let layer = surface.create_layer();
            // Every category starts out visible
            surface.attach_layer(layer);
            debug!("Registered category — name={:?} layer={}", key, layer.0);
            CategoryEntry { count: 0, layer }
        })
    }

    /// Returns the entry for `category`, allocating and attaching a fresh
    /// layer the first time the normalized name is seen.
    pub fn get_or_create<S: MapSurface + ?Sized>(
        &mut self,
        category: &str,
        surface: &mut S,
    ) -> &CategoryEntry {
        self.entry_mut(category, surface)
    }

    pub fn increment<S: MapSurface + ?Sized>(
        &mut self,
        category: &str,
        surface: &mut S,
    ) -> &CategoryEntry {
        let entry = self.entry_mut(category, surface);
        entry.count += 1;
        entry
    }

    /// Registered names in display order.
    pub fn all_categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort_by(|a, b| locale_cmp(a, b));
        names
    }

    pub fn count_of(&self, category: &str) -> usize {
        self.entries
            .get(&normalize_category(category))
            .map_or(0, |e| e.count)
    }

    pub fn layer_of(&self, category: &str) -> Option<LayerId> {
        self.entries
            .get(&normalize_category(category))
            .map(|e| e.layer)
    }

    pub fn get(&self, category: &str) -> Option<&CategoryEntry> {
        self.entries.get(&normalize_category(category))
    }

    /// Entries in no particular order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &CategoryEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Primary collation key: canonical decomposition with combining marks
/// dropped, then lower-cased. "Émeute" keys as "emeute".
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Accent- and case-insensitive first, then case-insensitive, then the raw
/// string, so "Émeute" sorts between "Eels" and "Extortion" and "armed
/// robbery" sits next to "Armed robbery".
fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}
