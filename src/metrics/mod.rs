use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters for engine and synchronizer activity.
#[derive(Debug, Default, Clone)]
pub struct ResizeMetrics {
    commits: u64,
    rollbacks: u64,
    stale_rejections: u64,
    drags_started: u64,
    drags_cancelled: u64,
    layout_passes: u64,
    coalesced_changes: u64,
}

impl ResizeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }

    pub fn record_rollback(&mut self) {
        self.rollbacks = self.rollbacks.saturating_add(1);
    }

    pub fn record_stale_rejection(&mut self) {
        self.stale_rejections = self.stale_rejections.saturating_add(1);
    }

    pub fn record_drag_started(&mut self) {
        self.drags_started = self.drags_started.saturating_add(1);
    }

    pub fn record_drag_cancelled(&mut self) {
        self.drags_cancelled = self.drags_cancelled.saturating_add(1);
    }

    pub fn record_layout_pass(&mut self) {
        self.layout_passes = self.layout_passes.saturating_add(1);
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced_changes = self.coalesced_changes.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            commits: self.commits,
            rollbacks: self.rollbacks,
            stale_rejections: self.stale_rejections,
            drags_started: self.drags_started,
            drags_cancelled: self.drags_cancelled,
            layout_passes: self.layout_passes,
            coalesced_changes: self.coalesced_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub commits: u64,
    pub rollbacks: u64,
    pub stale_rejections: u64,
    pub drags_started: u64,
    pub drags_cancelled: u64,
    pub layout_passes: u64,
    pub coalesced_changes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "resize_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("rollbacks".to_string(), json!(self.rollbacks));
        map.insert("stale_rejections".to_string(), json!(self.stale_rejections));
        map.insert("drags_started".to_string(), json!(self.drags_started));
        map.insert("drags_cancelled".to_string(), json!(self.drags_cancelled));
        map.insert("layout_passes".to_string(), json!(self.layout_passes));
        map.insert("coalesced_changes".to_string(), json!(self.coalesced_changes));
        map
    }
}
