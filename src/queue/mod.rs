//! queue: single-flight FIFO task queue.
//!
//! One worker thread drains a VecDeque of boxed tasks:
//! - at most one task runs at any time;
//! - tasks run strictly in submission order;
//! - an Err or a panic from a task is logged and counted, draining continues.
//!
//! Состояния: Idle <-> Draining.
//! - enqueue в Idle переводит очередь в Draining и будит воркер;
//! - в Draining enqueue только дописывает в хвост;
//! - воркер, обнаружив пустой хвост после задачи, возвращается в Idle и будит ждущих wait_idle().
//!
//! Синхронизация: Mutex<Inner> + два Condvar (work_cv - есть работа, idle_cv - стало пусто).
//! Blocking waits from inside a task return WaitOnWorker instead of deadlocking.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_task_completed, record_task_enqueued, record_task_failed};
use crate::util::lock_recover;

mod handle;

pub use handle::TaskHandle;

pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Draining,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
    pub pending: usize,
    pub state: QueueState,
}

struct Job {
    seq: u64,
    label: String,
    task: Task,
}

struct Inner {
    pending: VecDeque<Job>,
    state: QueueState,
    shutdown: bool,
    next_seq: u64,
    enqueued: u64,
    completed: u64,
    failed: u64,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    work_cv: Condvar,
    idle_cv: Condvar,
    worker: OnceLock<ThreadId>,
}

impl Shared {
    pub(crate) fn on_worker(&self) -> bool {
        self.worker.get() == Some(&thread::current().id())
    }
}

pub struct TaskQueue {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Start the worker thread. `name` only labels the thread.
    pub fn new(name: &str) -> Result<Self> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                state: QueueState::Idle,
                shutdown: false,
                next_seq: 1,
                enqueued: 0,
                completed: 0,
                failed: 0,
            }),
            work_cv: Condvar::new(),
            idle_cv: Condvar::new(),
            worker: OnceLock::new(),
        });

        let for_worker = shared.clone();
        let jh = thread::Builder::new()
            .name(format!("stagedb-{name}"))
            .spawn(move || worker_loop(for_worker))
            .with_context(|| format!("spawn task queue worker '{name}'"))?;
        let _ = shared.worker.set(jh.thread().id());

        Ok(Self {
            shared,
            worker: Some(jh),
        })
    }

    /// Append a task; returns its sequence number without waiting for it.
    pub fn enqueue<F>(&self, label: impl Into<String>, task: F) -> u64
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let label = label.into();
        let mut g = lock_recover(&self.shared.inner);
        let seq = g.next_seq;
        g.next_seq += 1;
        g.enqueued += 1;
        debug!("queue: enqueue #{} '{}' (pending={})", seq, label, g.pending.len());
        g.pending.push_back(Job {
            seq,
            label,
            task: Box::new(task),
        });
        record_task_enqueued();
        if g.state == QueueState::Idle {
            g.state = QueueState::Draining;
            self.shared.work_cv.notify_one();
        }
        seq
    }

    /// Like `enqueue`, but the task's value can be collected through the handle.
    /// If the task fails, the handle reports `TaskFailed`.
    pub fn enqueue_with_result<T, F>(&self, label: impl Into<String>, f: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = mpsc::channel();
        let seq = self.enqueue(label.clone(), move || {
            let v = f()?;
            // receiver may be gone (caller dropped the handle), that's fine
            let _ = tx.send(v);
            Ok(())
        });
        TaskHandle::new(seq, label, rx, self.shared.clone())
    }

    /// Block until nothing is pending and no task is running.
    pub fn wait_idle(&self) -> StoreResult<()> {
        if self.shared.on_worker() {
            return Err(StoreError::WaitOnWorker);
        }
        let mut g = lock_recover(&self.shared.inner);
        while g.state == QueueState::Draining || !g.pending.is_empty() {
            g = self
                .shared
                .idle_cv
                .wait(g)
                .unwrap_or_else(|e| e.into_inner());
        }
        Ok(())
    }

    /// Ok(true) if the queue went idle within `timeout`.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> StoreResult<bool> {
        if self.shared.on_worker() {
            return Err(StoreError::WaitOnWorker);
        }
        let deadline = Instant::now() + timeout;
        let mut g = lock_recover(&self.shared.inner);
        while g.state == QueueState::Draining || !g.pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let (ng, _) = self
                .shared
                .idle_cv
                .wait_timeout(g, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            g = ng;
        }
        Ok(true)
    }

    pub fn stats(&self) -> QueueStats {
        let g = lock_recover(&self.shared.inner);
        QueueStats {
            enqueued: g.enqueued,
            completed: g.completed,
            failed: g.failed,
            pending: g.pending.len(),
            state: g.state,
        }
    }

    pub fn state(&self) -> QueueState {
        lock_recover(&self.shared.inner).state
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        {
            let mut g = lock_recover(&self.shared.inner);
            g.shutdown = true;
            self.shared.work_cv.notify_all();
        }
        // Воркер дочищает уже поставленные задачи и выходит.
        // Если последний владелец очереди умер внутри задачи - join на себя невозможен.
        if let Some(jh) = self.worker.take() {
            if !self.shared.on_worker() {
                let _ = jh.join();
            }
        }
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut g = lock_recover(&shared.inner);
            loop {
                if let Some(job) = g.pending.pop_front() {
                    break Some(job);
                }
                if g.state != QueueState::Idle {
                    g.state = QueueState::Idle;
                    shared.idle_cv.notify_all();
                }
                if g.shutdown {
                    break None;
                }
                g = shared.work_cv.wait(g).unwrap_or_else(|e| e.into_inner());
            }
        };
        let Some(job) = job else {
            debug!("queue: worker stopped");
            return;
        };

        let ok = run_job(job);

        let mut g = lock_recover(&shared.inner);
        if ok {
            g.completed += 1;
        } else {
            g.failed += 1;
        }
    }
}

fn run_job(job: Job) -> bool {
    let Job { seq, label, task } = job;
    debug!("queue: run #{} '{}'", seq, label);
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(())) => {
            record_task_completed();
            true
        }
        Ok(Err(e)) => {
            warn!("queue: task #{} '{}' failed: {:#}", seq, label, e);
            record_task_failed();
            false
        }
        Err(payload) => {
            error!(
                "queue: task #{} '{}' panicked: {}",
                seq,
                label,
                panic_message(payload.as_ref())
            );
            record_task_failed();
            false
        }
    }
}

fn panic_message(p: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn runs_in_submission_order() -> Result<()> {
        let q = TaskQueue::new("order")?;
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..20u32 {
            let seen = seen.clone();
            q.enqueue(format!("t{i}"), move || {
                // early tasks take longer: ordering must not depend on latency
                if i < 5 {
                    thread::sleep(Duration::from_millis(5));
                }
                seen.lock().unwrap().push(i);
                Ok(())
            });
        }
        q.wait_idle()?;
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn failure_and_panic_do_not_stall() -> Result<()> {
        let q = TaskQueue::new("resilience")?;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s1 = seen.clone();
        q.enqueue("ok-1", move || {
            s1.lock().unwrap().push("ok-1");
            Ok(())
        });
        q.enqueue("err", || Err(anyhow!("boom")));
        q.enqueue("panic", || panic!("kaboom"));
        let s2 = seen.clone();
        q.enqueue("ok-2", move || {
            s2.lock().unwrap().push("ok-2");
            Ok(())
        });
        q.wait_idle()?;

        assert_eq!(*seen.lock().unwrap(), vec!["ok-1", "ok-2"]);
        let st = q.stats();
        assert_eq!(st.enqueued, 4);
        assert_eq!(st.completed, 2);
        assert_eq!(st.failed, 2);
        assert_eq!(st.pending, 0);
        assert_eq!(st.state, QueueState::Idle);
        Ok(())
    }

    #[test]
    fn handle_yields_value_or_task_failed() -> Result<()> {
        let q = TaskQueue::new("handles")?;
        let ok = q.enqueue_with_result("forty-two", || Ok(42u32));
        let bad = q.enqueue_with_result::<u32, _>("nope", || Err(anyhow!("no value")));
        assert_eq!(ok.wait(), Ok(42));
        match bad.wait() {
            Err(StoreError::TaskFailed { label, .. }) => assert_eq!(label, "nope"),
            other => panic!("expected TaskFailed, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn wait_from_worker_is_rejected() -> Result<()> {
        let q = Arc::new(TaskQueue::new("reentrant")?);
        let inner_q = q.clone();
        let h = q.enqueue_with_result("inner-wait", move || Ok(inner_q.wait_idle()));
        let inner_result = h.wait()?;
        assert_eq!(inner_result, Err(StoreError::WaitOnWorker));
        q.wait_idle()?;
        Ok(())
    }

    #[test]
    fn idle_timeout_reports_busy_queue() -> Result<()> {
        let q = TaskQueue::new("timeout")?;
        let (tx, rx) = mpsc::channel::<()>();
        q.enqueue("blocked", move || {
            let _ = rx.recv_timeout(Duration::from_secs(5));
            Ok(())
        });
        assert!(!q.wait_idle_timeout(Duration::from_millis(20))?);
        assert_eq!(q.state(), QueueState::Draining);
        tx.send(()).unwrap();
        assert!(q.wait_idle_timeout(Duration::from_secs(5))?);
        Ok(())
    }

    #[test]
    fn drop_finishes_pending_tasks() -> Result<()> {
        let seen = Arc::new(Mutex::new(0u32));
        {
            let q = TaskQueue::new("drop")?;
            for _ in 0..10 {
                let seen = seen.clone();
                q.enqueue("inc", move || {
                    *seen.lock().unwrap() += 1;
                    Ok(())
                });
            }
        }
        assert_eq!(*seen.lock().unwrap(), 10);
        Ok(())
    }
}
