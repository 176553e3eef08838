// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

/// A joinable group of spawned tasks.
///
/// `go` increments an outstanding-tasks counter and runs the closure on a
/// fresh thread; the counter drops when the closure returns, panicking or
/// not. `wait` blocks until the counter reaches zero; `done` hands out a
/// channel closed at the same instant. Both are safe to use concurrently
/// from any number of threads.
#[derive(Clone, Default)]
pub struct Goes {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    condv: Condvar,
}

#[derive(Default)]
struct State {
    count: usize,
    watchers: Vec<Sender<()>>,
}

struct Guard {
    inner: Arc<Inner>,
}

impl Drop for Guard {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.count -= 1;
        if state.count == 0 {
            // Dropping the senders closes every watcher channel.
            state.watchers.clear();
            self.inner.condv.notify_all();
        }
    }
}

impl Goes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on a new thread, tracked by this group.
    pub fn go<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.state.lock().count += 1;
        let guard = Guard {
            inner: self.inner.clone(),
        };
        thread::spawn(move || {
            let _guard = guard;
            f();
        });
    }

    /// Blocks until every task passed to `go` has returned.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        self.inner.condv.wait_while(&mut state, |s| s.count > 0);
    }

    /// Returns a channel that is closed once the outstanding count reaches
    /// zero. A group with no tasks yields an already-closed channel.
    pub fn done(&self) -> Receiver<()> {
        let (tx, rx) = bounded(0);
        let mut state = self.inner.state.lock();
        if state.count > 0 {
            state.watchers.push(tx);
        }
        // With no outstanding tasks `tx` drops here, closing `rx`.
        rx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn wait_returns_after_every_task() {
        let goes = Goes::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let hits = hits.clone();
            goes.go(move || {
                thread::sleep(Duration::from_millis(5));
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        goes.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn done_closes_once_drained() {
        let goes = Goes::new();
        goes.go(|| thread::sleep(Duration::from_millis(10)));
        let done = goes.done();
        assert!(done.recv_timeout(Duration::from_secs(5)).is_err());
        goes.wait();
    }

    #[test]
    fn done_on_idle_group_is_closed() {
        let goes = Goes::new();
        assert!(goes.done().recv().is_err());
    }

    #[test]
    fn wait_survives_panicking_task() {
        let goes = Goes::new();
        goes.go(|| panic!("boom"));
        goes.go(|| {});
        goes.wait();
    }

    #[test]
    fn concurrent_waiters() {
        let goes = Goes::new();
        goes.go(|| thread::sleep(Duration::from_millis(20)));
        let watchers: Vec<_> = (0..4).map(|_| goes.done()).collect();
        let g2 = goes.clone();
        let joined = thread::spawn(move || g2.wait());
        for w in watchers {
            assert!(w.recv_timeout(Duration::from_secs(5)).is_err());
        }
        joined.join().unwrap();
    }
}
