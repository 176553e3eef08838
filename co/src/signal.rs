// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

/// A broadcast-style wake-up primitive.
///
/// `signal` wakes at most one waiter currently blocked in [`Waiter::wait`];
/// `broadcast` wakes every waiter created before the call, exactly once.
/// A waiter created after a signal or broadcast does not observe it.
///
/// Implemented as a single channel cell swapped under a lock: broadcast
/// closes the current channel and installs a fresh one, signal attempts a
/// non-blocking rendezvous send.
#[derive(Clone)]
pub struct Signal {
    cell: Arc<Mutex<Cell>>,
}

struct Cell {
    tx: Sender<()>,
    rx: Receiver<()>,
}

/// Handle observing the next wake-up of the [`Signal`] it was created from.
pub struct Waiter {
    rx: Receiver<()>,
}

impl Default for Signal {
    fn default() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            cell: Arc::new(Mutex::new(Cell { tx, rx })),
        }
    }
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes at most one waiter currently blocked on the signal. Lost if no
    /// waiter is blocked right now.
    pub fn signal(&self) {
        let cell = self.cell.lock();
        // Rendezvous send: succeeds only when a waiter is parked in recv.
        let _ = cell.tx.try_send(());
    }

    /// Wakes every waiter created before this call exactly once.
    pub fn broadcast(&self) {
        let (tx, rx) = bounded(0);
        let mut cell = self.cell.lock();
        // Dropping the previous sender closes the channel every existing
        // waiter holds, waking them all.
        cell.tx = tx;
        cell.rx = rx;
    }

    /// Creates a handle wired to the current channel generation.
    pub fn new_waiter(&self) -> Waiter {
        Waiter {
            rx: self.cell.lock().rx.clone(),
        }
    }
}

impl Waiter {
    /// Blocks until the next `signal` delivery or `broadcast` close.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// Like `wait`, with a deadline. Returns false on timeout.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => true,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn broadcast_wakes_existing_waiters() {
        let sig = Signal::new();
        let waiters: Vec<_> = (0..8).map(|_| sig.new_waiter()).collect();
        let handles: Vec<_> = waiters
            .into_iter()
            .map(|w| thread::spawn(move || w.wait()))
            .collect();
        thread::sleep(Duration::from_millis(20));
        sig.broadcast();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn waiter_created_after_broadcast_stays_parked() {
        let sig = Signal::new();
        sig.broadcast();
        let late = sig.new_waiter();
        assert!(!late.wait_timeout(Duration::from_millis(50)));
    }

    #[test]
    fn signal_wakes_at_most_one() {
        let sig = Signal::new();
        let a = sig.new_waiter();
        let b = sig.new_waiter();
        let ha = thread::spawn(move || a.wait_timeout(Duration::from_millis(300)));
        let hb = thread::spawn(move || b.wait_timeout(Duration::from_millis(300)));
        thread::sleep(Duration::from_millis(50));
        sig.signal();
        let woken = [ha.join().unwrap(), hb.join().unwrap()]
            .iter()
            .filter(|w| **w)
            .count();
        assert_eq!(woken, 1);
    }

    #[test]
    fn signal_without_waiter_is_lost() {
        let sig = Signal::new();
        sig.signal();
        let w = sig.new_waiter();
        assert!(!w.wait_timeout(Duration::from_millis(50)));
    }
}
