// src/discover/filter.rs

use crate::unit::UnitLocation;

/// Case-insensitive substring match on the unit id.
#[derive(Debug, Clone)]
pub struct NameFilter {
    needle: String,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Self {
        Self {
            needle: pattern.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, unit_id: &str) -> bool {
        self.needle.is_empty() || unit_id.to_lowercase().contains(&self.needle)
    }
}

/// Keep only the units accepted by `filter`; `None` keeps everything.
pub fn apply_filter(units: Vec<UnitLocation>, filter: Option<&NameFilter>) -> Vec<UnitLocation> {
    match filter {
        Some(f) => units.into_iter().filter(|u| f.matches(&u.id)).collect(),
        None => units,
    }
}
