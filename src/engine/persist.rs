use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ColumnId, LayoutMode, SizingState};

/// Serializable sizing state for save/restore across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u64,
    pub widths: BTreeMap<ColumnId, u32>,
    pub layout_mode: LayoutMode,
}

impl PersistedState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<&SizingState> for PersistedState {
    fn from(state: &SizingState) -> Self {
        Self {
            version: state.version,
            widths: state.widths.to_btree(),
            layout_mode: state.layout_mode,
        }
    }
}

/// Outcome of a restore.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoreReport {
    /// Store version the restored widths were committed as.
    pub version: u64,
    /// Persisted ids with no matching column, dropped.
    pub dropped: Vec<ColumnId>,
    /// Persisted widths that fell outside their column's bounds.
    pub clamped: Vec<ColumnId>,
}
