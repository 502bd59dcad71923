use std::sync::Arc;

use crate::model::SizingState;

use super::core::{ListenerId, SizingStateStore};

/// Read-only store handle for observers such as the layout synchronizer.
///
/// It can read snapshots and manage listeners but cannot publish, so widths
/// only ever change through the engine that owns the store.
///
/// ```compile_fail
/// use grid_resize::{ColumnConfig, CommitRequest, EngineOptions, WidthMap, create_resize_engine};
///
/// let engine = create_resize_engine(&[ColumnConfig::new("a", 100)], EngineOptions::default()).unwrap();
/// engine.store().commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 1)])));
/// ```
#[derive(Clone)]
pub struct StoreView {
    store: SizingStateStore,
}

impl StoreView {
    pub(super) fn new(store: SizingStateStore) -> Self {
        Self { store }
    }

    pub fn get_state(&self) -> Arc<SizingState> {
        self.store.get_state()
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn history_versions(&self) -> Vec<u64> {
        self.store.history_versions()
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&SizingState) + Send + 'static,
    {
        self.store.on_change(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.store.remove_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.store.listener_count()
    }
}
