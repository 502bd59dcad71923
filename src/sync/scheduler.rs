use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub type FrameTask = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Cooperative scheduler. Implementations must defer tasks: running one
/// from inside `schedule` would re-enter the caller.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: FrameTask) -> TaskId;

    /// Drop a task that has not run yet. Returns false if it already ran or
    /// was never scheduled.
    fn cancel(&self, id: TaskId) -> bool;
}

#[derive(Default)]
struct QueueInner {
    next_id: u64,
    tasks: VecDeque<(TaskId, FrameTask)>,
}

/// Single-threaded task queue drained once per display frame by the host.
#[derive(Default)]
pub struct FrameQueue {
    inner: Mutex<QueueInner>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every task queued before this call. Tasks scheduled while the
    /// frame runs wait for the next one. Returns how many tasks ran.
    pub fn run_frame(&self) -> usize {
        let tasks = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut guard.tasks)
        };
        let count = tasks.len();
        for (_, task) in tasks {
            task();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .map(|guard| guard.tasks.len())
            .unwrap_or(0)
    }
}

impl Scheduler for FrameQueue {
    fn schedule(&self, task: FrameTask) -> TaskId {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = TaskId(guard.next_id);
        guard.next_id += 1;
        guard.tasks.push_back((id, task));
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = guard.tasks.len();
        guard.tasks.retain(|(task_id, _)| *task_id != id);
        guard.tasks.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn runs_queued_tasks_once() {
        let queue = FrameQueue::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let hits = Arc::clone(&hits);
            queue.schedule(Box::new(move || hits.lock().unwrap().push(n)));
        }
        assert_eq!(queue.run_frame(), 3);
        assert_eq!(*hits.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.run_frame(), 0);
    }

    #[test]
    fn cancel_removes_pending_task() {
        let queue = FrameQueue::new();
        let id = queue.schedule(Box::new(|| panic!("cancelled task ran")));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.run_frame(), 0);
    }

    #[test]
    fn tasks_scheduled_during_frame_wait() {
        let queue = Arc::new(FrameQueue::new());
        let inner = Arc::clone(&queue);
        queue.schedule(Box::new(move || {
            inner.schedule(Box::new(|| {}));
        }));
        assert_eq!(queue.run_frame(), 1);
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.run_frame(), 1);
    }
}
