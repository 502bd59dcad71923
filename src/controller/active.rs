use std::sync::{Arc, RwLock};

use crate::model::ColumnId;

/// Observable id of the column currently being dragged.
#[derive(Debug, Default)]
pub struct ActiveColumn {
    inner: RwLock<Option<ColumnId>>,
}

impl ActiveColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, column_id: impl Into<ColumnId>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(column_id.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn current(&self) -> Option<ColumnId> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is(&self, column_id: &str) -> bool {
        self.current().as_deref() == Some(column_id)
    }
}

pub type SharedActiveColumn = Arc<ActiveColumn>;
