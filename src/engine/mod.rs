//! Public resize surface.
//!
//! [`create_resize_engine`] builds one engine per table. The engine owns the
//! resolved columns, the drag controller and a store handle, and routes every
//! width change (drag, programmatic, reset, restore, container resize)
//! through the solver and a store commit.

mod core;
mod options;
mod persist;

pub use core::{ResizeEngine, create_resize_engine};
pub use options::{CommitMode, EngineOptions, ResizeCallback};
pub use persist::{PersistedState, RestoreReport};
