//! Error types shared by every resize component.

mod types;

pub use types::{ResizeError, Result};
