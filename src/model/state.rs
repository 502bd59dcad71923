use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::column::ColumnId;

/// Table layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Table width is constant; resizing redistributes among columns.
    #[default]
    Fixed,
    /// Table width follows the column widths.
    Auto,
}

/// Redistribution policy applied when one column's width changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Independent,
    Proportional,
    Auto,
}

/// Ordered column id to width mapping. Order follows column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WidthMap {
    entries: Vec<(ColumnId, u32)>,
}

impl WidthMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<ColumnId>,
    {
        let mut map = Self::new();
        for (id, width) in pairs {
            map.insert(id, width);
        }
        map
    }

    /// Insert or replace; new ids are appended.
    pub fn insert(&mut self, id: impl Into<ColumnId>, width: u32) {
        let id = id.into();
        match self.position(&id) {
            Some(idx) => self.entries[idx].1 = width,
            None => self.entries.push((id, width)),
        }
    }

    /// Replace the width of an existing id. Returns false when absent.
    pub fn set(&mut self, id: &str, width: u32) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.entries[idx].1 = width;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, width)| *width)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(id, width)| (id.as_str(), *width))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn widths(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(_, width)| *width)
    }

    pub fn total(&self) -> u64 {
        self.widths().map(u64::from).sum()
    }

    pub fn to_btree(&self) -> BTreeMap<ColumnId, u32> {
        self.entries.iter().cloned().collect()
    }
}

/// Immutable, versioned snapshot published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizingState {
    pub widths: WidthMap,
    pub version: u64,
    pub layout_mode: LayoutMode,
}

impl SizingState {
    pub fn new(widths: WidthMap, layout_mode: LayoutMode) -> Self {
        Self {
            widths,
            version: 0,
            layout_mode,
        }
    }

    pub fn width_of(&self, id: &str) -> Option<u32> {
        self.widths.get(id)
    }

    pub fn total(&self) -> u64 {
        self.widths.total()
    }
}

/// The only message passed from the controller to the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDelta {
    pub column_id: ColumnId,
    pub delta_pixels: f64,
}

impl ResizeDelta {
    pub fn new(column_id: impl Into<ColumnId>, delta_pixels: f64) -> Self {
        Self {
            column_id: column_id.into(),
            delta_pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut map = WidthMap::from_pairs([("a", 10), ("b", 20)]);
        map.insert("a", 15);
        map.insert("c", 30);
        let ids: Vec<_> = map.ids().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(map.get("a"), Some(15));
        assert_eq!(map.total(), 65);
    }

    #[test]
    fn enums_use_lowercase_names() {
        assert_eq!(serde_json::to_string(&LayoutMode::Auto).unwrap(), "\"auto\"");
        let strategy: Strategy = serde_json::from_str("\"proportional\"").unwrap();
        assert_eq!(strategy, Strategy::Proportional);
    }
}
