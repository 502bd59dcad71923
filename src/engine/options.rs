use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::error::Result;
use crate::geometry::{Axis, ResizeDirection};
use crate::logging::Logger;
use crate::metrics::ResizeMetrics;
use crate::model::{DEFAULT_FALLBACK_WIDTH, DEFAULT_MIN_WIDTH, LayoutMode, SizingState, Strategy};

/// Called with the new state after every store change.
pub type ResizeCallback = Arc<dyn Fn(&SizingState) + Send + Sync>;

/// When drag updates reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Every pointer move commits.
    #[default]
    OnChange,
    /// Moves only update a preview; release commits once.
    OnEnd,
}

/// Configuration knobs for a resize engine.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub layout_mode: LayoutMode,
    pub strategy: Strategy,
    /// Floor for columns that do not declare a min width.
    pub default_min_width: u32,
    /// Table width under fixed layout. Defaults to the sum of initial widths.
    pub container_width: Option<u32>,
    /// Width for columns that declare none.
    pub fallback_width: u32,
    pub commit_mode: CommitMode,
    pub direction: ResizeDirection,
    pub axis: Axis,
    /// Distance from a column edge that still grabs its resize handle.
    pub handle_tolerance: u32,
    /// Past versions kept restorable by the store.
    pub history_limit: usize,
    #[serde(skip)]
    pub on_resize: Option<ResizeCallback>,
    #[serde(skip)]
    pub logger: Option<Logger>,
    #[serde(skip)]
    pub metrics: Option<Arc<Mutex<ResizeMetrics>>>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Fixed,
            strategy: Strategy::Independent,
            default_min_width: DEFAULT_MIN_WIDTH,
            container_width: None,
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            commit_mode: CommitMode::OnChange,
            direction: ResizeDirection::Ltr,
            axis: Axis::X,
            handle_tolerance: 1,
            history_limit: 64,
            on_resize: None,
            logger: None,
            metrics: None,
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_layout_mode(mut self, layout_mode: LayoutMode) -> Self {
        self.layout_mode = layout_mode;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_container_width(mut self, width: u32) -> Self {
        self.container_width = Some(width);
        self
    }

    pub fn with_commit_mode(mut self, commit_mode: CommitMode) -> Self {
        self.commit_mode = commit_mode;
        self
    }

    pub fn with_on_resize<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SizingState) + Send + Sync + 'static,
    {
        self.on_resize = Some(Arc::new(callback));
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(ResizeMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<ResizeMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}
