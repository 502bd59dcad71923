use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::controller::{ControllerSettings, PointerResizeController, SharedActiveColumn};
use crate::error::{ResizeError, Result};
use crate::geometry::{Point, ResizeDirection};
use crate::input::{EventFlow, InputEvent, PointerAction};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, ResizeMetrics};
use crate::model::{
    Column, ColumnConfig, ColumnId, LayoutMode, ResizeDelta, SizingState, Strategy, WidthMap,
};
use crate::solver;
use crate::store::{CommitRequest, ListenerId, SizingStateStore, StoreConfig, StoreView};
use crate::width;

use super::options::{CommitMode, EngineOptions};
use super::persist::{PersistedState, RestoreReport};

const LOG_TARGET: &str = "grid_resize::engine";

/// Build an engine for one table.
pub fn create_resize_engine(
    columns: &[ColumnConfig],
    options: EngineOptions,
) -> Result<ResizeEngine> {
    ResizeEngine::new(columns, options)
}

pub struct ResizeEngine {
    columns: Vec<Column>,
    options: EngineOptions,
    container_width: u32,
    store: SizingStateStore,
    controller: PointerResizeController,
    resize_listener: Option<ListenerId>,
}

impl std::fmt::Debug for ResizeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeEngine")
            .field("columns", &self.columns)
            .field("container_width", &self.container_width)
            .field("resize_listener", &self.resize_listener)
            .finish_non_exhaustive()
    }
}

impl ResizeEngine {
    pub fn new(configs: &[ColumnConfig], options: EngineOptions) -> Result<Self> {
        check_strategy(options.strategy, options.layout_mode)?;

        let columns =
            Column::resolve_all(configs, options.default_min_width, options.fallback_width)?;
        let defaults = default_widths(&columns);
        let natural = u32::try_from(defaults.total()).unwrap_or(u32::MAX);
        let container_width = options.container_width.unwrap_or(natural);

        let widths = match options.layout_mode {
            LayoutMode::Fixed => solver::fit_to_container(&defaults, &columns, container_width)?,
            LayoutMode::Auto => defaults,
        };

        let store = SizingStateStore::new(
            widths,
            options.layout_mode,
            StoreConfig {
                fallback_width: options.fallback_width,
                history_limit: options.history_limit,
            },
        );
        let resize_listener = options.on_resize.as_ref().map(|callback| {
            let callback = Arc::clone(callback);
            store.on_change(move |state| callback(state))
        });

        let controller = PointerResizeController::new(ControllerSettings {
            axis: options.axis,
            direction: options.direction,
        });

        let engine = Self {
            columns,
            options,
            container_width,
            store,
            controller,
            resize_listener,
        };
        engine.log(
            LogLevel::Info,
            "engine_created",
            [
                json_kv("columns", json!(engine.columns.len())),
                json_kv("container_width", json!(engine.container_width)),
                json_kv("layout_mode", json!(engine.options.layout_mode)),
                json_kv("strategy", json!(engine.options.strategy)),
            ],
        );
        Ok(engine)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Read-only handle to the store, e.g. for a
    /// [`LayoutSynchronizer`](crate::sync::LayoutSynchronizer). Widths change
    /// only through the engine, so bounds and the fixed total always hold.
    pub fn store(&self) -> StoreView {
        self.store.view()
    }

    pub fn state(&self) -> Arc<SizingState> {
        self.store.get_state()
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.store.get_state().layout_mode
    }

    /// Table width: the fixed container, or the column total under auto layout.
    pub fn container_width(&self) -> u32 {
        let state = self.store.get_state();
        match state.layout_mode {
            LayoutMode::Fixed => self.container_width,
            LayoutMode::Auto => u32::try_from(state.total()).unwrap_or(u32::MAX),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&SizingState) + Send + 'static,
    {
        self.store.on_change(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.store.remove_listener(id)
    }

    pub fn active_column(&self) -> Option<ColumnId> {
        self.controller.active_column().current()
    }

    pub fn active_column_handle(&self) -> SharedActiveColumn {
        self.controller.active_column()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    /// Uncommitted widths of an on-end drag.
    pub fn preview_widths(&self) -> Option<WidthMap> {
        self.controller
            .session()
            .and_then(|session| session.preview.clone())
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        self.options
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.lock().ok().map(|guard| guard.snapshot()))
    }

    /// Emit the current counters through the configured logger.
    pub fn log_metrics(&self) {
        let Some(logger) = self.options.logger.as_ref() else {
            return;
        };
        if let Some(snapshot) = self.metrics_snapshot() {
            let _ = logger.log_event(snapshot.to_log_event(LOG_TARGET));
        }
    }

    pub fn begin_drag(&mut self, column_id: &str, position: Point) -> Result<()> {
        let anchor = self.store.get_state();
        let origin = anchor.version;
        let column = self.columns.iter().find(|column| column.id == column_id);
        self.controller.begin_drag(
            column,
            column_id,
            position,
            anchor,
            self.options.strategy,
        )?;
        if let Err(err) = self.store.pin(origin) {
            self.controller.cancel_drag();
            return Err(err);
        }

        self.record(ResizeMetrics::record_drag_started);
        self.log(
            LogLevel::Debug,
            "drag_started",
            [
                json_kv("column", json!(column_id)),
                json_kv("version", json!(origin)),
            ],
        );
        Ok(())
    }

    /// Feed a pointer move. Returns the store version after the update.
    ///
    /// On [`ResizeError::StaleWrite`] the session has already been re-anchored
    /// on the latest state at `position`; the next move continues from there.
    ///
    /// With deferred commits an external write simply re-anchors the preview
    /// on the latest state, replaying the pointer travel so far.
    pub fn update_drag(&mut self, position: Point) -> Result<u64> {
        if self.options.commit_mode == CommitMode::OnEnd {
            self.reanchor_if_stale();
        }
        let step = self.controller.update_drag(position)?;
        let widths = solver::solve(
            &step.anchor.widths,
            &self.columns,
            &step.delta,
            step.strategy,
            self.container_width,
            step.anchor.layout_mode,
        )?;

        if self.options.commit_mode == CommitMode::OnEnd {
            self.controller.set_preview(widths);
            return Ok(self.store.version());
        }

        let current = self.store.get_state();
        if current.version == step.base_version && current.widths == widths {
            return Ok(current.version);
        }

        match self.commit(CommitRequest::new(step.base_version, widths)) {
            Ok(version) => {
                self.controller.record_commit(version);
                Ok(version)
            }
            Err(err @ ResizeError::StaleWrite { .. }) => {
                self.controller.rebase(self.store.get_state(), position);
                self.log(
                    LogLevel::Debug,
                    "drag_rebased",
                    [json_kv("column", json!(step.delta.column_id))],
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Close the drag, making its last state authoritative. Returns the
    /// final store version.
    pub fn end_drag(&mut self) -> Result<u64> {
        let replay = self.controller.session().and_then(|session| {
            let stale = session.base_version != self.store.version();
            (stale && session.preview.is_some()).then_some(session.last_position)
        });
        if let Some(position) = replay {
            self.update_drag(position)?;
        }

        let session = self.controller.end_drag()?;
        self.store.unpin(session.origin_version);

        let version = match session.preview {
            Some(preview) if self.store.get_state().widths != preview => {
                self.commit(CommitRequest::new(session.base_version, preview))?
            }
            _ => self.store.version(),
        };

        self.log(
            LogLevel::Debug,
            "drag_ended",
            [
                json_kv("column", json!(session.column_id)),
                json_kv("updates", json!(session.updates)),
                json_kv("version", json!(version)),
            ],
        );
        Ok(version)
    }

    /// Abandon the drag and roll the store back to its pre-drag widths.
    /// No-op without a session.
    pub fn cancel_drag(&mut self) -> Result<()> {
        let Some(session) = self.controller.cancel_drag() else {
            return Ok(());
        };

        let rolled_back = self.store.version() != session.origin_version;
        let outcome = if rolled_back {
            self.store.rollback_to(session.origin_version).map(|_| ())
        } else {
            Ok(())
        };
        self.store.unpin(session.origin_version);
        outcome?;

        if rolled_back {
            self.record(ResizeMetrics::record_rollback);
            self.refit_if_needed()?;
        }
        self.record(ResizeMetrics::record_drag_cancelled);
        self.log(
            LogLevel::Debug,
            "drag_cancelled",
            [
                json_kv("column", json!(session.column_id)),
                json_kv("rolled_back", json!(rolled_back)),
            ],
        );
        Ok(())
    }

    pub fn get_column_width(&self, id: &str) -> Result<u32> {
        self.store
            .get_state()
            .width_of(id)
            .ok_or_else(|| ResizeError::UnknownColumn(id.to_string()))
    }

    /// Programmatic resize, solved with the engine's strategy like a drag.
    pub fn set_column_width(&mut self, id: &str, width: u32) -> Result<u64> {
        let column = self.require_column(id)?;
        if !column.can_resize {
            return Err(ResizeError::NotResizable(id.to_string()));
        }

        let state = self.store.get_state();
        let current = state
            .width_of(id)
            .ok_or_else(|| ResizeError::UnknownColumn(id.to_string()))?;
        let delta = ResizeDelta::new(id, f64::from(width) - f64::from(current));
        let widths = solver::solve(
            &state.widths,
            &self.columns,
            &delta,
            self.options.strategy,
            self.container_width,
            state.layout_mode,
        )?;
        self.commit(CommitRequest::new(state.version, widths))
    }

    pub fn reset_column(&mut self, id: &str) -> Result<u64> {
        let default_width = self.require_column(id)?.default_width;
        self.set_column_width(id, default_width)
    }

    /// Return every column to its configured width.
    pub fn reset_all(&mut self) -> Result<u64> {
        let state = self.store.get_state();
        let defaults = default_widths(&self.columns);
        let widths = self.fit_for(state.layout_mode, defaults)?;
        self.commit(CommitRequest::new(state.version, widths))
    }

    /// Size a column to the widest of `cells` plus `padding`, clamped to its
    /// bounds.
    pub fn fit_column_to_content<'a, I>(&mut self, id: &str, cells: I, padding: u32) -> Result<u64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let column = self.require_column(id)?;
        let content = u32::try_from(width::widest(cells)).unwrap_or(u32::MAX);
        let target = column.clamp(content.saturating_add(padding));
        self.set_column_width(id, target)
    }

    pub fn set_container_width(&mut self, container_width: u32) -> Result<u64> {
        let state = self.store.get_state();
        if state.layout_mode == LayoutMode::Auto {
            self.container_width = container_width;
            return Ok(state.version);
        }
        if container_width == self.container_width {
            return Ok(state.version);
        }

        let widths = solver::fit_to_container(&state.widths, &self.columns, container_width)?;
        let version = self.commit(CommitRequest::new(state.version, widths))?;
        self.container_width = container_width;
        self.log(
            LogLevel::Debug,
            "container_resized",
            [json_kv("container_width", json!(container_width))],
        );
        Ok(version)
    }

    pub fn set_layout_mode(&mut self, layout_mode: LayoutMode) -> Result<u64> {
        check_strategy(self.options.strategy, layout_mode)?;
        let state = self.store.get_state();
        if state.layout_mode == layout_mode {
            return Ok(state.version);
        }

        let widths = self.fit_for(layout_mode, state.widths.clone())?;
        let version = self.commit(
            CommitRequest::new(state.version, widths).with_layout_mode(layout_mode),
        )?;
        self.options.layout_mode = layout_mode;
        Ok(version)
    }

    /// Replace the column set. Existing columns keep their widths, new ones
    /// start at their configured width; under fixed layout the result is fit
    /// to the container in the same commit. Cancels an active drag.
    pub fn set_columns(&mut self, configs: &[ColumnConfig]) -> Result<u64> {
        let columns = Column::resolve_all(
            configs,
            self.options.default_min_width,
            self.options.fallback_width,
        )?;
        self.cancel_drag()?;

        let ids: Vec<ColumnId> = columns.iter().map(|column| column.id.clone()).collect();
        let defaults: HashMap<ColumnId, u32> = columns
            .iter()
            .map(|column| (column.id.clone(), column.default_width))
            .collect();
        let layout_mode = self.layout_mode();
        let container_width = self.container_width;

        let version = self.store.sync_columns_with(&ids, &defaults, |widths| {
            let clamped = WidthMap::from_pairs(columns.iter().map(|column| {
                let width = widths.get(&column.id).unwrap_or(column.default_width);
                (column.id.clone(), column.clamp(width))
            }));
            match layout_mode {
                LayoutMode::Fixed => solver::fit_to_container(&clamped, &columns, container_width),
                LayoutMode::Auto => Ok(clamped),
            }
        })?;

        self.record(ResizeMetrics::record_commit);
        self.log(
            LogLevel::Info,
            "columns_synced",
            [
                json_kv("columns", json!(columns.len())),
                json_kv("version", json!(version)),
            ],
        );
        self.columns = columns;
        Ok(version)
    }

    pub fn persist(&self) -> PersistedState {
        PersistedState::from(self.store.get_state().as_ref())
    }

    /// Apply persisted widths. Unknown ids are dropped with a warning rather
    /// than failing the restore; out-of-bounds widths are clamped.
    pub fn restore(&mut self, persisted: &PersistedState) -> Result<RestoreReport> {
        check_strategy(self.options.strategy, persisted.layout_mode)?;
        self.cancel_drag()?;

        let state = self.store.get_state();
        let mut widths = state.widths.clone();
        let mut report = RestoreReport::default();

        for (id, &width) in &persisted.widths {
            let Some(column) = self.column(id) else {
                report.dropped.push(id.clone());
                continue;
            };
            let clamped = column.clamp(width);
            if clamped != width {
                report.clamped.push(id.clone());
            }
            widths.set(id, clamped);
        }

        if !report.dropped.is_empty() {
            self.log(
                LogLevel::Warn,
                "restore_dropped_columns",
                [
                    json_kv("dropped", json!(report.dropped)),
                    json_kv("persisted_version", json!(persisted.version)),
                ],
            );
        }

        let widths = self.fit_for(persisted.layout_mode, widths)?;
        report.version = self.commit(
            CommitRequest::new(state.version, widths).with_layout_mode(persisted.layout_mode),
        )?;
        self.options.layout_mode = persisted.layout_mode;
        Ok(report)
    }

    /// Column whose resize handle sits within tolerance of `offset` along the
    /// drag axis. Handles are on the trailing edge in reading direction.
    pub fn handle_at(&self, offset: i32) -> Option<ColumnId> {
        let state = self.store.get_state();
        let total = i64::try_from(state.total()).unwrap_or(i64::MAX);
        let tolerance = i64::from(self.options.handle_tolerance);
        let offset = i64::from(offset);

        let mut edge = 0i64;
        let mut hit: Option<(i64, &str)> = None;
        for (id, width) in state.widths.iter() {
            edge += i64::from(width);
            let position = match self.options.direction {
                ResizeDirection::Ltr => edge,
                ResizeDirection::Rtl => total - edge,
            };
            let distance = (position - offset).abs();
            let resizable = self.column(id).is_some_and(|column| column.can_resize);
            if resizable && distance <= tolerance && hit.is_none_or(|(best, _)| distance < best) {
                hit = Some((distance, id));
            }
        }
        hit.map(|(_, id)| id.to_string())
    }

    /// Drive the drag state machine from pointer input.
    pub fn handle_pointer(&mut self, action: PointerAction) -> Result<EventFlow> {
        let axis = self.options.axis;
        match action {
            PointerAction::Press(point) => {
                if self.controller.is_dragging() {
                    return Ok(EventFlow::Consumed);
                }
                match self.handle_at(point.along(axis)) {
                    Some(id) => {
                        self.begin_drag(&id, point)?;
                        Ok(EventFlow::Consumed)
                    }
                    None => Ok(EventFlow::Continue),
                }
            }
            PointerAction::Move(point) => {
                if !self.controller.is_dragging() {
                    return Ok(EventFlow::Continue);
                }
                self.tolerate_stale(|engine| engine.update_drag(point))?;
                Ok(EventFlow::Consumed)
            }
            PointerAction::Release(point) => {
                if !self.controller.is_dragging() {
                    return Ok(EventFlow::Continue);
                }
                self.tolerate_stale(|engine| engine.update_drag(point))?;
                self.end_drag()?;
                Ok(EventFlow::Consumed)
            }
            PointerAction::Cancel => {
                if !self.controller.is_dragging() {
                    return Ok(EventFlow::Continue);
                }
                self.cancel_drag()?;
                Ok(EventFlow::Consumed)
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<EventFlow> {
        match event {
            InputEvent::Pointer(action) => self.handle_pointer(action),
            InputEvent::ContainerResized(width) => {
                self.set_container_width(width)?;
                Ok(EventFlow::Consumed)
            }
        }
    }

    fn tolerate_stale<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<u64>,
    {
        match step(self) {
            Ok(_) | Err(ResizeError::StaleWrite { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn reanchor_if_stale(&mut self) {
        let latest = self.store.get_state();
        let Some(session) = self.controller.session() else {
            return;
        };
        if session.base_version == latest.version {
            return;
        }
        let column = session.column_id.clone();
        self.controller.reanchor(latest);
        self.log(
            LogLevel::Debug,
            "drag_reanchored",
            [json_kv("column", json!(column))],
        );
    }

    fn require_column(&self, id: &str) -> Result<&Column> {
        self.column(id)
            .ok_or_else(|| ResizeError::UnknownColumn(id.to_string()))
    }

    fn fit_for(&self, layout_mode: LayoutMode, widths: WidthMap) -> Result<WidthMap> {
        match layout_mode {
            LayoutMode::Fixed => solver::fit_to_container(&widths, &self.columns, self.container_width),
            LayoutMode::Auto => Ok(widths),
        }
    }

    /// After a rollback the container may have moved on; fit if it did.
    fn refit_if_needed(&mut self) -> Result<()> {
        let state = self.store.get_state();
        if state.layout_mode == LayoutMode::Fixed
            && state.total() != u64::from(self.container_width)
        {
            let widths =
                solver::fit_to_container(&state.widths, &self.columns, self.container_width)?;
            self.commit(CommitRequest::new(state.version, widths))?;
        }
        Ok(())
    }

    fn commit(&self, request: CommitRequest) -> Result<u64> {
        match self.store.commit(request) {
            Ok(version) => {
                self.record(ResizeMetrics::record_commit);
                Ok(version)
            }
            Err(err) => {
                if matches!(err, ResizeError::StaleWrite { .. }) {
                    self.record(ResizeMetrics::record_stale_rejection);
                }
                Err(err)
            }
        }
    }

    fn record(&self, update: fn(&mut ResizeMetrics)) {
        if let Some(metrics) = self.options.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.options.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

impl Drop for ResizeEngine {
    fn drop(&mut self) {
        if let Some(id) = self.resize_listener.take() {
            self.store.remove_listener(id);
        }
    }
}

fn check_strategy(strategy: Strategy, layout_mode: LayoutMode) -> Result<()> {
    if strategy == Strategy::Auto && layout_mode == LayoutMode::Fixed {
        return Err(ResizeError::IncompatibleStrategy {
            strategy,
            layout_mode,
        });
    }
    Ok(())
}

fn default_widths(columns: &[Column]) -> WidthMap {
    WidthMap::from_pairs(
        columns
            .iter()
            .map(|column| (column.id.clone(), column.default_width)),
    )
}
