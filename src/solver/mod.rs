//! Width constraint solver.
//!
//! Pure functions from (anchor widths, columns, delta, strategy, container,
//! layout mode) to new widths. Nothing in here touches the store; identical
//! inputs always produce identical outputs, which drag cancel and the
//! property tests rely on.

mod core;

pub use core::{fit_to_container, solve};
