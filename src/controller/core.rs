use std::sync::Arc;

use crate::error::{ResizeError, Result};
use crate::geometry::{Axis, Point, ResizeDirection};
use crate::model::{Column, ColumnId, ResizeDelta, SizingState, Strategy, WidthMap};

use super::active::{ActiveColumn, SharedActiveColumn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerSettings {
    pub axis: Axis,
    pub direction: ResizeDirection,
}

/// State of one pointer interaction, from press to release or cancel.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub column_id: ColumnId,
    pub anchor_position: Point,
    /// Widths every delta is applied to.
    pub anchor: Arc<SizingState>,
    /// Version in place before the drag started; cancel rolls back to it.
    pub origin_version: u64,
    /// Version the next commit must be derived from.
    pub base_version: u64,
    pub strategy: Strategy,
    /// Uncommitted widths when commits are deferred to release.
    pub preview: Option<WidthMap>,
    pub last_position: Point,
    pub updates: u64,
}

/// One pointer move translated for the solver.
#[derive(Debug, Clone)]
pub struct DragStep {
    pub delta: ResizeDelta,
    pub anchor: Arc<SizingState>,
    pub base_version: u64,
    pub strategy: Strategy,
}

pub struct PointerResizeController {
    settings: ControllerSettings,
    session: Option<DragSession>,
    active: SharedActiveColumn,
}

impl PointerResizeController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            session: None,
            active: Arc::new(ActiveColumn::new()),
        }
    }

    /// Shared handle observers can poll for the column being dragged.
    pub fn active_column(&self) -> SharedActiveColumn {
        Arc::clone(&self.active)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Open a session on `column_id`. `column` is the resolved config for
    /// that id, if the table has one.
    pub fn begin_drag(
        &mut self,
        column: Option<&Column>,
        column_id: &str,
        position: Point,
        anchor: Arc<SizingState>,
        strategy: Strategy,
    ) -> Result<()> {
        if let Some(session) = self.session.as_ref() {
            return Err(ResizeError::SessionAlreadyActive(session.column_id.clone()));
        }

        let resizable = column.is_some_and(|c| c.id == column_id && c.can_resize)
            && anchor.widths.contains(column_id);
        if !resizable {
            return Err(ResizeError::NotResizable(column_id.to_string()));
        }

        let version = anchor.version;
        self.session = Some(DragSession {
            column_id: column_id.to_string(),
            anchor_position: position,
            anchor,
            origin_version: version,
            base_version: version,
            strategy,
            preview: None,
            last_position: position,
            updates: 0,
        });
        self.active.set(column_id);
        Ok(())
    }

    pub fn update_drag(&mut self, position: Point) -> Result<DragStep> {
        let settings = self.settings;
        let session = self.session.as_mut().ok_or(ResizeError::NoActiveSession)?;

        let raw = f64::from(position.along(settings.axis))
            - f64::from(session.anchor_position.along(settings.axis));
        session.last_position = position;
        session.updates += 1;

        Ok(DragStep {
            delta: ResizeDelta::new(session.column_id.clone(), settings.direction.apply(raw)),
            anchor: Arc::clone(&session.anchor),
            base_version: session.base_version,
            strategy: session.strategy,
        })
    }

    /// Advance the base version after the caller committed a step.
    pub fn record_commit(&mut self, version: u64) {
        if let Some(session) = self.session.as_mut() {
            session.base_version = version;
        }
    }

    pub fn set_preview(&mut self, widths: WidthMap) {
        if let Some(session) = self.session.as_mut() {
            session.preview = Some(widths);
        }
    }

    /// Re-anchor on a newer snapshot after an external write, so further
    /// deltas are measured from `position` against `anchor`. The origin
    /// version is kept for cancel.
    pub fn rebase(&mut self, anchor: Arc<SizingState>, position: Point) {
        if let Some(session) = self.session.as_mut() {
            session.base_version = anchor.version;
            session.anchor = anchor;
            session.anchor_position = position;
            session.preview = None;
        }
    }

    /// Swap in a newer snapshot but keep measuring from the original press,
    /// so the whole pointer travel is replayed against `anchor`. Used while
    /// commits are deferred and nothing of the drag is in the store yet.
    pub fn reanchor(&mut self, anchor: Arc<SizingState>) {
        if let Some(session) = self.session.as_mut() {
            session.base_version = anchor.version;
            session.anchor = anchor;
            session.preview = None;
        }
    }

    /// Close the session so its final state can be made authoritative.
    pub fn end_drag(&mut self) -> Result<DragSession> {
        let session = self.session.take().ok_or(ResizeError::NoActiveSession)?;
        self.active.clear();
        Ok(session)
    }

    /// Close the session without committing anything further. Returns the
    /// closed session, or `None` when idle.
    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        let session = self.session.take()?;
        self.active.clear();
        Some(session)
    }
}
