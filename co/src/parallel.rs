// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::Goes;

/// A unit of work handed to the fan-out queue.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Spawns one worker per CPU pulling from a bounded queue, runs `cb` to fill
/// the queue, and returns a channel that closes once the queue has drained
/// and every worker has finished. The queue closes when `cb` returns.
pub fn parallel<F>(cb: F) -> Receiver<()>
where
    F: FnOnce(&Sender<Work>) + Send + 'static,
{
    let workers = thread::available_parallelism().map_or(1, |n| n.get());
    let (tx, rx) = bounded::<Work>(workers * 2);

    let goes = Goes::new();
    for _ in 0..workers {
        let rx = rx.clone();
        goes.go(move || {
            for work in rx {
                work();
            }
        });
    }
    goes.go(move || {
        cb(&tx);
        // `tx` drops here, closing the queue.
    });

    goes.done()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn runs_every_item() {
        let hits = Arc::new(AtomicUsize::new(0));
        let done = {
            let hits = hits.clone();
            parallel(move |queue| {
                for _ in 0..100 {
                    let hits = hits.clone();
                    queue
                        .send(Box::new(move || {
                            hits.fetch_add(1, Ordering::SeqCst);
                        }))
                        .unwrap();
                }
            })
        };
        assert_eq!(
            done.recv_timeout(Duration::from_secs(10)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn empty_queue_completes() {
        let done = parallel(|_| {});
        assert_eq!(
            done.recv_timeout(Duration::from_secs(10)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        );
    }
}
