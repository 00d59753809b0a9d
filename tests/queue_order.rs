use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use StageDB::{QueueState, StoreError, TaskQueue};

#[test]
fn random_latencies_keep_submission_order() -> Result<()> {
    let q = TaskQueue::new("order")?;
    let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let running = Arc::new(AtomicUsize::new(0));
    let max_running = Arc::new(AtomicUsize::new(0));
    let mut rng = oorandom::Rand32::new(0x5EED);

    for i in 0..64u32 {
        let delay = rng.rand_range(0..3);
        let log = log.clone();
        let running = running.clone();
        let max_running = max_running.clone();
        q.enqueue(format!("t{}", i), move || {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            max_running.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(delay as u64));
            log.lock().unwrap().push(i);
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
    }
    q.wait_idle()?;

    let got = log.lock().unwrap().clone();
    assert_eq!(got, (0..64).collect::<Vec<_>>());
    assert_eq!(max_running.load(Ordering::SeqCst), 1, "single-flight");
    let st = q.stats();
    assert_eq!(st.enqueued, 64);
    assert_eq!(st.completed, 64);
    assert_eq!(st.pending, 0);
    assert_eq!(st.state, QueueState::Idle);
    Ok(())
}

#[test]
fn enqueue_from_many_threads_runs_everything_once() -> Result<()> {
    let q = Arc::new(TaskQueue::new("mt")?);
    let hits = Arc::new(AtomicUsize::new(0));

    let mut joins = Vec::new();
    for t in 0..4 {
        let q = q.clone();
        let hits = hits.clone();
        joins.push(thread::spawn(move || {
            // порядок внутри одного потока сохраняется
            let seen = Arc::new(Mutex::new(Vec::new()));
            let mut last = None;
            for i in 0..25 {
                let hits = hits.clone();
                let seen = seen.clone();
                last = Some(q.enqueue_with_result(format!("p{}-{}", t, i), move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(i);
                    Ok(())
                }));
            }
            if let Some(h) = last {
                h.wait()?;
            }
            let v = seen.lock().unwrap().clone();
            assert_eq!(v, (0..25).collect::<Vec<_>>());
            Ok::<(), anyhow::Error>(())
        }));
    }
    for j in joins {
        j.join().map_err(|_| anyhow!("producer panicked"))??;
    }
    q.wait_idle()?;
    assert_eq!(hits.load(Ordering::SeqCst), 100);
    Ok(())
}

#[test]
fn failing_and_panicking_tasks_do_not_stop_the_queue() -> Result<()> {
    let q = TaskQueue::new("resilient")?;
    let done = Arc::new(AtomicUsize::new(0));

    let d = done.clone();
    q.enqueue("ok-1", move || {
        d.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let bad = q.enqueue_with_result::<u32, _>("fails", || Err(anyhow!("boom")));
    let boom = q.enqueue_with_result::<u32, _>("panics", || panic!("kaboom"));
    let d = done.clone();
    let after = q.enqueue_with_result("ok-2", move || {
        d.fetch_add(1, Ordering::SeqCst);
        Ok(7u32)
    });

    assert_eq!(after.wait()?, 7);
    assert!(matches!(bad.wait(), Err(StoreError::TaskFailed { .. })));
    assert!(matches!(boom.wait(), Err(StoreError::TaskFailed { .. })));
    assert_eq!(done.load(Ordering::SeqCst), 2);
    assert_eq!(q.stats().failed, 2);
    Ok(())
}

#[test]
fn blocking_wait_inside_a_task_is_refused() -> Result<()> {
    let q = Arc::new(TaskQueue::new("reentrant")?);
    let inner_q = q.clone();
    let h = q.enqueue_with_result("nested", move || {
        let r = inner_q.wait_idle();
        Ok(matches!(r, Err(StoreError::WaitOnWorker)))
    });
    assert!(h.wait()?, "wait_idle on the worker must fail fast");
    assert!(q.wait_idle_timeout(Duration::from_secs(5))?);
    Ok(())
}
