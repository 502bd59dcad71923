use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use crate::error::{ResizeError, Result};
use crate::model::{ColumnId, DEFAULT_FALLBACK_WIDTH, LayoutMode, SizingState, WidthMap};

use super::view::StoreView;

/// Change callback. Runs synchronously, in commit order, with the newly
/// published state.
pub type Listener = Box<dyn FnMut(&SizingState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Store tuning knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Width given to columns that appear without a default.
    pub fallback_width: u32,
    /// Number of past versions kept for rollback. Pinned versions do not count
    /// against eviction.
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            history_limit: 64,
        }
    }
}

/// A proposed new width mapping.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Version of the snapshot the widths were derived from.
    pub base_version: u64,
    pub widths: WidthMap,
    /// Switch layout mode along with the widths.
    pub layout_mode: Option<LayoutMode>,
    /// Skip the stale-write check.
    pub force: bool,
}

impl CommitRequest {
    pub fn new(base_version: u64, widths: WidthMap) -> Self {
        Self {
            base_version,
            widths,
            layout_mode: None,
            force: false,
        }
    }

    pub fn forced(widths: WidthMap) -> Self {
        Self {
            force: true,
            ..Self::new(0, widths)
        }
    }

    pub fn with_layout_mode(mut self, layout_mode: LayoutMode) -> Self {
        self.layout_mode = Some(layout_mode);
        self
    }
}

struct StoreInner {
    current: Arc<SizingState>,
    history: VecDeque<Arc<SizingState>>,
    pinned: HashMap<u64, usize>,
    notifying: bool,
    config: StoreConfig,
}

impl StoreInner {
    fn publish(&mut self, widths: WidthMap, layout_mode: LayoutMode) -> Arc<SizingState> {
        let state = Arc::new(SizingState {
            widths,
            version: self.current.version + 1,
            layout_mode,
        });
        self.current = Arc::clone(&state);
        self.history.push_back(Arc::clone(&state));
        self.evict();
        state
    }

    fn evict(&mut self) {
        while self.history.len() > self.config.history_limit.max(1) {
            let newest = self.current.version;
            let candidate = self
                .history
                .iter()
                .position(|s| s.version != newest && !self.pinned.contains_key(&s.version));
            match candidate {
                Some(idx) => {
                    self.history.remove(idx);
                }
                None => break,
            }
        }
    }

    fn find(&self, version: u64) -> Option<Arc<SizingState>> {
        self.history
            .iter()
            .find(|state| state.version == version)
            .cloned()
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<Mutex<Listener>>)>,
}

/// Versioned store of per-column widths and layout mode.
#[derive(Clone)]
pub struct SizingStateStore {
    inner: Arc<RwLock<StoreInner>>,
    listeners: Arc<Mutex<ListenerTable>>,
}

impl SizingStateStore {
    pub fn new(widths: WidthMap, layout_mode: LayoutMode, config: StoreConfig) -> Self {
        let initial = Arc::new(SizingState::new(widths, layout_mode));
        let inner = StoreInner {
            current: Arc::clone(&initial),
            history: VecDeque::from([initial]),
            pinned: HashMap::new(),
            notifying: false,
            config,
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        // Writers only ever swap whole snapshots, so a poisoned lock still
        // guards a consistent state.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current immutable snapshot.
    pub fn get_state(&self) -> Arc<SizingState> {
        Arc::clone(&self.read().current)
    }

    pub fn version(&self) -> u64 {
        self.read().current.version
    }

    /// Read-only handle sharing this store's state and listeners.
    pub fn view(&self) -> StoreView {
        StoreView::new(self.clone())
    }

    /// Publish new widths. Returns the new version.
    pub fn commit(&self, request: CommitRequest) -> Result<u64> {
        let state = {
            let mut guard = self.inner.write().map_err(|_| ResizeError::Poisoned)?;
            if guard.notifying {
                return Err(ResizeError::ReentrantCommit);
            }

            let actual = guard.current.version;
            if !request.force && request.base_version != actual {
                return Err(ResizeError::StaleWrite {
                    expected: request.base_version,
                    actual,
                });
            }

            let widths = align_to(&guard.current.widths, &request.widths)?;
            let layout_mode = request.layout_mode.unwrap_or(guard.current.layout_mode);
            let state = guard.publish(widths, layout_mode);
            guard.notifying = true;
            state
        };

        self.notify(&state);
        Ok(state.version)
    }

    /// Republish the widths recorded at `version` as a new version.
    pub fn rollback_to(&self, version: u64) -> Result<u64> {
        let state = {
            let mut guard = self.inner.write().map_err(|_| ResizeError::Poisoned)?;
            if guard.notifying {
                return Err(ResizeError::ReentrantCommit);
            }
            let target = guard
                .find(version)
                .ok_or(ResizeError::UnknownVersion(version))?;
            let state = guard.publish(target.widths.clone(), target.layout_mode);
            guard.notifying = true;
            state
        };

        self.notify(&state);
        Ok(state.version)
    }

    /// Reconcile the width mapping with a new column set.
    pub fn sync_columns(
        &self,
        column_ids: &[ColumnId],
        defaults: &HashMap<ColumnId, u32>,
    ) -> Result<u64> {
        self.sync_columns_with(column_ids, defaults, Ok)
    }

    /// Like [`sync_columns`](Self::sync_columns), but `adjust` may rewrite the
    /// reconciled map (keeping its key set) before it is published, so
    /// listeners never observe the intermediate mapping.
    pub fn sync_columns_with<F>(
        &self,
        column_ids: &[ColumnId],
        defaults: &HashMap<ColumnId, u32>,
        adjust: F,
    ) -> Result<u64>
    where
        F: FnOnce(WidthMap) -> Result<WidthMap>,
    {
        let mut seen = HashSet::new();
        if let Some(dup) = column_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ResizeError::InvalidConstraint(format!(
                "duplicate column id `{dup}`"
            )));
        }

        let state = {
            let mut guard = self.inner.write().map_err(|_| ResizeError::Poisoned)?;
            if guard.notifying {
                return Err(ResizeError::ReentrantCommit);
            }

            let fallback = guard.config.fallback_width;
            let reconciled = WidthMap::from_pairs(column_ids.iter().map(|id| {
                let width = guard
                    .current
                    .widths
                    .get(id)
                    .or_else(|| defaults.get(id).copied())
                    .unwrap_or(fallback);
                (id.clone(), width)
            }));
            let adjusted = adjust(reconciled.clone())?;
            let widths = align_to(&reconciled, &adjusted)?;

            let layout_mode = guard.current.layout_mode;
            let state = guard.publish(widths, layout_mode);
            // Older versions describe a different column set.
            guard.history.retain(|s| s.version == state.version);
            guard.pinned.clear();
            guard.notifying = true;
            state
        };

        self.notify(&state);
        Ok(state.version)
    }

    /// Keep `version` in history until a matching [`unpin`](Self::unpin).
    pub fn pin(&self, version: u64) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| ResizeError::Poisoned)?;
        if guard.find(version).is_none() {
            return Err(ResizeError::UnknownVersion(version));
        }
        *guard.pinned.entry(version).or_insert(0) += 1;
        Ok(())
    }

    pub fn unpin(&self, version: u64) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let remaining = guard.pinned.get_mut(&version).map(|count| {
            *count -= 1;
            *count
        });
        if remaining == Some(0) {
            guard.pinned.remove(&version);
        }
        guard.evict();
    }

    /// Versions currently restorable through [`rollback_to`](Self::rollback_to).
    pub fn history_versions(&self) -> Vec<u64> {
        self.read().history.iter().map(|s| s.version).collect()
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&SizingState) + Send + 'static,
    {
        let mut table = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(table.next_id);
        table.next_id += 1;
        let boxed: Listener = Box::new(listener);
        table.entries.push((id, Arc::new(Mutex::new(boxed))));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut table = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = table.entries.len();
        table.entries.retain(|(entry_id, _)| *entry_id != id);
        table.entries.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|table| table.entries.len())
            .unwrap_or(0)
    }

    fn notify(&self, state: &SizingState) {
        let _reset = NotifyGuard { inner: &self.inner };
        let listeners: Vec<_> = {
            let table = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            table.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            // A listener that panicked earlier still gets later changes.
            let mut callback = listener.lock().unwrap_or_else(PoisonError::into_inner);
            callback(state);
        }
    }
}

/// Clears the notifying flag even if a listener panics.
struct NotifyGuard<'a> {
    inner: &'a RwLock<StoreInner>,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.notifying = false;
    }
}

/// Reorder `proposed` to follow `reference`, rejecting any key set mismatch.
fn align_to(reference: &WidthMap, proposed: &WidthMap) -> Result<WidthMap> {
    if let Some(extra) = proposed.ids().find(|id| !reference.contains(id)) {
        return Err(ResizeError::UnknownColumn(extra.to_string()));
    }
    reference
        .ids()
        .map(|id| {
            proposed
                .get(id)
                .map(|width| (id.to_string(), width))
                .ok_or_else(|| ResizeError::MissingWidth(id.to_string()))
        })
        .collect::<Result<Vec<_>>>()
        .map(WidthMap::from_pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SizingStateStore {
        SizingStateStore::new(
            WidthMap::from_pairs([("a", 100), ("b", 100)]),
            LayoutMode::Fixed,
            StoreConfig::default(),
        )
    }

    #[test]
    fn commit_bumps_version_and_notifies() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.on_change(move |state| sink.lock().unwrap().push(state.version));

        let v1 = store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 110), ("b", 90)])))
            .unwrap();
        let v2 = store
            .commit(CommitRequest::new(v1, WidthMap::from_pairs([("b", 80), ("a", 120)])))
            .unwrap();

        assert_eq!((v1, v2), (1, 2));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        let ids: Vec<_> = store.get_state().widths.ids().map(str::to_string).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn stale_commit_rejected_unless_forced() {
        let store = store();
        store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 110), ("b", 90)])))
            .unwrap();

        let err = store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 120), ("b", 80)])))
            .unwrap_err();
        assert!(matches!(err, ResizeError::StaleWrite { expected: 0, actual: 1 }));
        assert_eq!(store.get_state().width_of("a"), Some(110));

        let version = store
            .commit(CommitRequest::forced(WidthMap::from_pairs([("a", 120), ("b", 80)])))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn commit_rejects_mismatched_keys() {
        let store = store();
        let err = store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 1), ("b", 1), ("c", 1)])))
            .unwrap_err();
        assert!(matches!(err, ResizeError::UnknownColumn(id) if id == "c"));

        let err = store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 1)])))
            .unwrap_err();
        assert!(matches!(err, ResizeError::MissingWidth(id) if id == "b"));
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn reentrant_commit_rejected() {
        let store = store();
        let nested = store.clone();
        let outcome = Arc::new(Mutex::new(None));
        let record = Arc::clone(&outcome);
        store.on_change(move |state| {
            let result = nested.commit(CommitRequest::new(
                state.version,
                WidthMap::from_pairs([("a", 1), ("b", 1)]),
            ));
            *record.lock().unwrap() = Some(result);
        });

        let version = store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 110), ("b", 90)])))
            .unwrap();

        let nested_result = outcome.lock().unwrap().take().unwrap();
        assert!(matches!(nested_result, Err(ResizeError::ReentrantCommit)));
        assert_eq!(version, 1);
        assert_eq!(store.version(), 1);
        assert_eq!(store.get_state().width_of("a"), Some(110));
    }

    #[test]
    fn rollback_republishes_old_widths_as_new_version() {
        let store = store();
        store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 150), ("b", 50)])))
            .unwrap();
        let version = store.rollback_to(0).unwrap();
        assert_eq!(version, 2);
        assert_eq!(store.get_state().widths, WidthMap::from_pairs([("a", 100), ("b", 100)]));

        let err = store.rollback_to(42).unwrap_err();
        assert!(matches!(err, ResizeError::UnknownVersion(42)));
    }

    #[test]
    fn history_is_bounded_but_keeps_pins() {
        let store = SizingStateStore::new(
            WidthMap::from_pairs([("a", 100)]),
            LayoutMode::Auto,
            StoreConfig {
                history_limit: 3,
                ..StoreConfig::default()
            },
        );
        store.pin(0).unwrap();
        for width in 101..110 {
            let base = store.version();
            store
                .commit(CommitRequest::new(base, WidthMap::from_pairs([("a", width)])))
                .unwrap();
        }
        let versions = store.history_versions();
        assert!(versions.contains(&0));
        assert!(versions.len() <= 3);
        assert_eq!(*versions.last().unwrap(), 9);

        store.unpin(0);
        store
            .commit(CommitRequest::new(9, WidthMap::from_pairs([("a", 200)])))
            .unwrap();
        assert_eq!(store.history_versions(), vec![8, 9, 10]);
    }

    #[test]
    fn sync_columns_adds_and_prunes() {
        let store = store();
        let mut defaults = HashMap::new();
        defaults.insert("c".to_string(), 70);
        let ids = vec!["c".to_string(), "a".to_string(), "d".to_string()];
        let version = store.sync_columns(&ids, &defaults).unwrap();

        let state = store.get_state();
        assert_eq!(version, 1);
        assert_eq!(
            state.widths,
            WidthMap::from_pairs([("c", 70), ("a", 100), ("d", DEFAULT_FALLBACK_WIDTH)])
        );
        assert_eq!(store.history_versions(), vec![1]);
    }

    #[test]
    fn sync_rejects_duplicate_ids() {
        let store = store();
        let ids = vec!["a".to_string(), "a".to_string()];
        let err = store.sync_columns(&ids, &HashMap::new()).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidConstraint(_)));
    }

    #[test]
    fn panicking_listener_keeps_receiving_changes() {
        use std::panic::{AssertUnwindSafe, catch_unwind};
        use std::sync::atomic::{AtomicU32, Ordering};

        let store = store();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        store.on_change(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("listener failure");
            }
        });

        let first = catch_unwind(AssertUnwindSafe(|| {
            store.commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 110), ("b", 90)])))
        }));
        assert!(first.is_err());
        assert_eq!(store.version(), 1);

        store
            .commit(CommitRequest::new(1, WidthMap::from_pairs([("a", 120), ("b", 80)])))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let store = store();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let id = store.on_change(move |_| *counter.lock().unwrap() += 1);
        assert!(store.remove_listener(id));
        store
            .commit(CommitRequest::new(0, WidthMap::from_pairs([("a", 120), ("b", 80)])))
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(!store.remove_listener(id));
    }
}
