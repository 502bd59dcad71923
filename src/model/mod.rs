//! Data model shared by the controller, solver and store.
//!
//! Column configuration is owned by the host table; the engine resolves it
//! once against its options and only ever reads the resolved [`Column`]s.

mod column;
mod state;

pub use column::{Column, ColumnConfig, ColumnId, DEFAULT_FALLBACK_WIDTH, DEFAULT_MIN_WIDTH};
pub use state::{LayoutMode, ResizeDelta, SizingState, Strategy, WidthMap};
