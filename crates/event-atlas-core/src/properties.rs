// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Resolution of semantic fields from schema-loose feature properties.
//!
//! Upstream exports spell the same field several ways (`category`,
//! `category *`, `category*`, ...). Every lookup goes through an ordered list
//! of candidate keys so the rest of the crate never sees the variants.

use serde_json::{Map, Value};

/// Feature `properties` object exactly as received.
pub type RawRecord = Map<String, Value>;

pub const TITLE_KEYS: &[&str] = &["title", "title*"];
pub const CATEGORY_KEYS: &[&str] = &["category", "category *", "category*"];
pub const DATE_KEYS: &[&str] = &["date"];
pub const COUNTRY_KEYS: &[&str] = &["country"];
pub const DESCRIPTION_KEYS: &[&str] = &["description", "description*"];
pub const GEOCODE_CONFIDENCE_KEYS: &[&str] = &["geocode_confidence"];
pub const GEOCODE_METHOD_KEYS: &[&str] = &["geocode_method"];

pub const UNTITLED: &str = "Untitled event";
pub const UNCATEGORISED: &str = "Uncategorised";

/// Returns the raw string form of the first candidate whose value is present
/// and non-blank, or `fallback`. Trimming only decides blankness; the
/// returned value is untouched.
pub fn resolve(record: &RawRecord, candidate_keys: &[&str], fallback: &str) -> String {
    candidate_keys
        .iter()
        .filter_map(|key| record.get(*key))
        .filter_map(value_as_string)
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Category lookup with the blank-after-trim rule applied to the result.
pub fn resolve_category(record: &RawRecord) -> String {
    normalize_category(&resolve(record, CATEGORY_KEYS, UNCATEGORISED))
}

/// Maps an absent or whitespace-only category to the placeholder.
pub fn normalize_category(raw: &str) -> String {
    if raw.trim().is_empty() {
        UNCATEGORISED.to_string()
    } else {
        raw.to_string()
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
