use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;

use crate::error::{ResizeError, Result};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::ResizeMetrics;
use crate::model::{LayoutMode, SizingState};
use crate::store::{ListenerId, StoreView};

use super::scheduler::{Scheduler, TaskId};

const LOG_TARGET: &str = "grid_resize::sync";

/// Render-layer hook receiving each applied layout.
pub trait LayoutSink: Send {
    fn apply_layout(&mut self, state: &SizingState) -> Result<()>;
}

#[derive(Default)]
struct PassState {
    pending: Option<TaskId>,
    last_applied: Option<blake3::Hash>,
    passes: u64,
}

/// Everything a scheduled pass needs; cloned into the listener and each task.
#[derive(Clone)]
struct PassContext {
    store: StoreView,
    scheduler: Arc<dyn Scheduler>,
    state: Arc<Mutex<PassState>>,
    sink: Arc<Mutex<Box<dyn LayoutSink>>>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<ResizeMetrics>>>,
}

impl PassContext {
    fn request(&self) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.pending.is_some() {
            if let Some(metrics) = self.metrics.as_ref() {
                if let Ok(mut metrics) = metrics.lock() {
                    metrics.record_coalesced();
                }
            }
            return;
        }
        let task = self.clone();
        guard.pending = Some(self.scheduler.schedule(Box::new(move || task.run())));
    }

    fn run(&self) {
        {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            guard.pending = None;
        }

        let snapshot = self.store.get_state();
        let fingerprint = fingerprint(&snapshot);
        let unchanged = self
            .state
            .lock()
            .map(|guard| guard.last_applied == Some(fingerprint))
            .unwrap_or(false);
        if unchanged {
            self.log(
                LogLevel::Trace,
                "layout_skipped",
                [json_kv("version", json!(snapshot.version))],
            );
            return;
        }

        let applied = match self.sink.lock() {
            Ok(mut sink) => sink.apply_layout(&snapshot),
            Err(_) => Err(ResizeError::Poisoned),
        };

        match applied {
            Ok(()) => {
                if let Ok(mut guard) = self.state.lock() {
                    guard.last_applied = Some(fingerprint);
                    guard.passes += 1;
                }
                if let Some(metrics) = self.metrics.as_ref() {
                    if let Ok(mut metrics) = metrics.lock() {
                        metrics.record_layout_pass();
                    }
                }
                self.log(
                    LogLevel::Debug,
                    "layout_applied",
                    [
                        json_kv("version", json!(snapshot.version)),
                        json_kv("columns", json!(snapshot.widths.len())),
                    ],
                );
            }
            Err(err) => self.log(
                LogLevel::Warn,
                "layout_failed",
                [
                    json_kv("version", json!(snapshot.version)),
                    json_kv("error", json!(err.to_string())),
                ],
            ),
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

fn fingerprint(state: &SizingState) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for (id, width) in state.widths.iter() {
        hasher.update(id.as_bytes());
        hasher.update(&[0]);
        hasher.update(&width.to_le_bytes());
    }
    let mode_tag: u8 = match state.layout_mode {
        LayoutMode::Fixed => 0,
        LayoutMode::Auto => 1,
    };
    hasher.update(&[mode_tag]);
    hasher.finalize()
}

struct Attachment {
    context: PassContext,
    listener: ListenerId,
}

/// Coalesces store changes into at most one pending layout pass.
pub struct LayoutSynchronizer {
    scheduler: Arc<dyn Scheduler>,
    state: Arc<Mutex<PassState>>,
    sink: Arc<Mutex<Box<dyn LayoutSink>>>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<ResizeMetrics>>>,
    attachment: Option<Attachment>,
}

impl LayoutSynchronizer {
    pub fn new<S>(scheduler: Arc<dyn Scheduler>, sink: S) -> Self
    where
        S: LayoutSink + 'static,
    {
        let sink: Box<dyn LayoutSink> = Box::new(sink);
        Self {
            scheduler,
            state: Arc::new(Mutex::new(PassState::default())),
            sink: Arc::new(Mutex::new(sink)),
            logger: None,
            metrics: None,
            attachment: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<ResizeMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Subscribe to `store`. Attaching while attached moves the subscription.
    pub fn attach(&mut self, store: &StoreView) {
        self.detach();

        let context = PassContext {
            store: store.clone(),
            scheduler: Arc::clone(&self.scheduler),
            state: Arc::clone(&self.state),
            sink: Arc::clone(&self.sink),
            logger: self.logger.clone(),
            metrics: self.metrics.clone(),
        };
        let listener_context = context.clone();
        let listener = store.on_change(move |_| listener_context.request());
        self.attachment = Some(Attachment { context, listener });
    }

    /// Unsubscribe and cancel any pending pass. No-op when detached.
    pub fn detach(&mut self) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };
        attachment.context.store.remove_listener(attachment.listener);

        let pending = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            guard.pending.take()
        };
        if let Some(task) = pending {
            self.scheduler.cancel(task);
        }
    }

    /// Schedule a pass without a store change, e.g. for a first paint.
    /// Forgets the last applied layout so the pass is not skipped.
    pub fn request_pass(&self) {
        if let Some(attachment) = self.attachment.as_ref() {
            if let Ok(mut guard) = self.state.lock() {
                guard.last_applied = None;
            }
            attachment.context.request();
        }
    }

    pub fn pending(&self) -> bool {
        self.state
            .lock()
            .map(|guard| guard.pending.is_some())
            .unwrap_or(false)
    }

    /// Layout passes that reached the sink.
    pub fn passes(&self) -> u64 {
        self.state.lock().map(|guard| guard.passes).unwrap_or(0)
    }
}

impl Drop for LayoutSynchronizer {
    fn drop(&mut self) {
        self.detach();
    }
}
