// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub const FALLBACK_ICON: &str = "other.png";

const ICON_TABLE: &[(&str, &str)] = &[
    ("piracy", "piracy.png"),
    ("armed robbery", "armed_robbery.png"),
    ("hijacking", "hijacking.png"),
    ("kidnapping", "kidnapping.png"),
    ("smuggling", "smuggling.png"),
    ("attack", "attack.png"),
    ("suspicious approach", "suspicious_approach.png"),
    ("protest", "protest.png"),
    ("other", FALLBACK_ICON),
    ("uncategorised", FALLBACK_ICON),
];

/// Icon asset filename for a category label. Unknown labels get the
/// fallback icon.
pub fn icon_for(category: &str) -> &'static str {
    let key = category.trim().to_lowercase();
    ICON_TABLE
        .iter()
        .find(|(label, _)| *label == key)
        .map_or(FALLBACK_ICON, |(_, file)| file)
}
