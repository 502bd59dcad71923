//! Pointer drag state machine.
//!
//! The controller knows nothing about solving or storing widths: it turns
//! pointer positions into [`ResizeDelta`](crate::model::ResizeDelta)s against
//! the snapshot captured when the drag began, and hands the session back on
//! end or cancel so the caller can finish the job.

mod active;
mod core;

pub use active::{ActiveColumn, SharedActiveColumn};
pub use core::{ControllerSettings, DragSession, DragStep, PointerResizeController};
