//! Interactive column resizing for data grids.
//!
//! A pointer drag on a column edge becomes a [`ResizeDelta`], the solver turns
//! it into a bounded width mapping, and a versioned [`SizingStateStore`]
//! publishes the result. [`LayoutSynchronizer`] applies published states to the
//! render layer at most once per frame.

pub mod controller;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod solver;
pub mod store;
pub mod sync;
pub mod width;

pub use controller::{ActiveColumn, DragSession, PointerResizeController, SharedActiveColumn};
pub use engine::{
    CommitMode, EngineOptions, PersistedState, ResizeCallback, ResizeEngine, RestoreReport,
    create_resize_engine,
};
pub use error::{ResizeError, Result};
pub use geometry::{Axis, Point, ResizeDirection};
pub use input::{EventFlow, InputEvent, PointerAction, translate};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult, MemorySink};
pub use metrics::{MetricSnapshot, ResizeMetrics};
pub use model::{Column, ColumnConfig, ColumnId, LayoutMode, ResizeDelta, SizingState, Strategy, WidthMap};
pub use solver::{fit_to_container, solve};
pub use store::{CommitRequest, ListenerId, SizingStateStore, StoreConfig, StoreView};
pub use sync::{FrameQueue, LayoutSink, LayoutSynchronizer, Scheduler};
pub use width::display_width;
