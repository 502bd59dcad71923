//! Authoritative, versioned sizing state.
//!
//! The store is the only owner of [`SizingState`](crate::model::SizingState).
//! Handles are cheap to clone; every clone observes the same state. Code that
//! only observes gets a [`StoreView`].

mod core;
mod view;

pub use core::{CommitRequest, Listener, ListenerId, SizingStateStore, StoreConfig};
pub use view::StoreView;
