//! Frame-aligned application of store changes to the render layer.
//!
//! Store listeners never touch the render layer directly. They mark a layout
//! pass as pending on a cooperative [`Scheduler`]; the pass reads whatever
//! state is current when it finally runs.

mod core;
mod scheduler;

pub use core::{LayoutSink, LayoutSynchronizer};
pub use scheduler::{FrameQueue, FrameTask, Scheduler, TaskId};
