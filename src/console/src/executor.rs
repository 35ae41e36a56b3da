//! A small cooperative executor for the console foreground.
//!
//! Tasks are plain `'static` futures. [`Executor::run_ready_tasks`] polls
//! every task that was ready when the round started, once, so a task that
//! keeps yielding cannot starve the caller. That makes the executor a
//! drop-in pending-work hook for [`Reader::blocking_read`]: while the reader
//! waits for input, background tasks keep running.
//!
//! [`Reader::blocking_read`]: crate::reader::Reader::blocking_read

use alloc::{boxed::Box, collections::BTreeMap, sync::Arc};
use core::{
    future::{poll_fn, Future},
    pin::Pin,
    task::{Context, Poll, Waker},
};

use crossbeam_queue::ArrayQueue;
use futures_util::task::ArcWake;
use kaiku_common::ConsoleError;
use kaiku_hal::PendingWork;

/// Capacity of the ready queue, counting repeated wakeups.
const RUN_QUEUE_CAPACITY: usize = 64;

/// Yields once, letting every other ready task run before resuming.
pub async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

/// Handle of a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

type BoxedTask = Pin<Box<dyn Future<Output = ()>>>;

/// Single-threaded executor with a bounded ready queue.
pub struct Executor {
    next_id: u64,
    tasks: BTreeMap<TaskId, BoxedTask>,
    ready: Arc<ArrayQueue<TaskId>>,
    wakers: BTreeMap<TaskId, Waker>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Creates an executor with no tasks.
    pub fn new() -> Self {
        Executor {
            next_id: 0,
            tasks: BTreeMap::new(),
            ready: Arc::new(ArrayQueue::new(RUN_QUEUE_CAPACITY)),
            wakers: BTreeMap::new(),
        }
    }

    /// Spawns `future`; it first runs on the next round.
    pub fn spawn(
        &mut self,
        future: impl Future<Output = ()> + 'static,
    ) -> Result<TaskId, ConsoleError> {
        let id = TaskId(self.next_id);
        self.ready.push(id).map_err(|_| ConsoleError::TaskQueueFull)?;
        self.next_id += 1;
        self.tasks.insert(id, Box::pin(future));
        Ok(id)
    }

    /// Number of tasks that have not finished.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when no task is waiting to be polled.
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty()
    }

    /// Polls each task that is ready right now, once. Returns how many
    /// tasks were polled.
    pub fn run_ready_tasks(&mut self) -> usize {
        let mut polled = 0;
        for _ in 0..self.ready.len() {
            let Some(id) = self.ready.pop() else {
                break;
            };
            // Finished tasks can still have stale wakeups queued.
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };

            let ready = &self.ready;
            let waker = self
                .wakers
                .entry(id)
                .or_insert_with(|| TaskWaker::new(id, ready.clone()));

            polled += 1;
            if task.as_mut().poll(&mut Context::from_waker(waker)).is_ready() {
                self.tasks.remove(&id);
                self.wakers.remove(&id);
            }
        }
        polled
    }

    /// Runs rounds until no task is ready. Tasks blocked on outside events
    /// stay spawned.
    pub fn run_until_idle(&mut self) {
        while !self.is_idle() {
            self.run_ready_tasks();
        }
    }
}

impl PendingWork for Executor {
    fn run_pending(&mut self) {
        self.run_ready_tasks();
    }
}

struct TaskWaker {
    id: TaskId,
    ready: Arc<ArrayQueue<TaskId>>,
}

impl TaskWaker {
    #[allow(clippy::new_ret_no_self)]
    fn new(id: TaskId, ready: Arc<ArrayQueue<TaskId>>) -> Waker {
        futures_util::task::waker(Arc::new(TaskWaker { id, ready }))
    }
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if arc_self.ready.push(arc_self.id).is_err() {
            log::warn!("executor ready queue full; wakeup for {:?} lost", arc_self.id);
        }
    }
}
