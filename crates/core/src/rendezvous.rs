// SPDX-License-Identifier: MIT

//! A generic N-party async rendezvous point.
//!
//! Generalizes the counter+condvar pairs scattered through
//! `original_source/tracker/tracker.py` (`rank_cond`/`rank_counter`,
//! `name_to_barrier_cond`/`name_to_barrier_counter`, `comm_cond`/
//! `lock_counter`, `restart_cond`/`new_node_counter`): every one of them is
//! "increment a counter; if you are the Nth arriver, do some leader-only
//! work, reset, and wake everyone; otherwise wait for the wake-up."
//!
//! One [`Rendezvous`] instance backs exactly one of those counter/condvar
//! pairs. It never holds its internal lock across an `.await` point.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// An N-party wake-all rendezvous point, reusable across successive
/// epochs (e.g. successive `barrier` calls on the same name).
pub struct Rendezvous {
    count: Mutex<u32>,
    epoch: AtomicU64,
    notify: Notify,
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl Rendezvous {
    pub fn new() -> Self {
        Self { count: Mutex::new(0), epoch: AtomicU64::new(0), notify: Notify::new() }
    }

    /// Arrive at the rendezvous. When this is the `n`th arrival of the
    /// current epoch, `on_last` runs synchronously (under the internal
    /// lock is already released by the time it runs) and every other
    /// waiter is woken; its side effects on shared state are guaranteed
    /// visible to all parties by the time their `arrive` call returns.
    ///
    /// `n` is read once per call; callers must ensure all parties of one
    /// epoch agree on its value (true for every primitive in this crate's
    /// caller, since `n` is always the world size or the size of a single
    /// elastic-join batch, both of which are stable for the epoch's
    /// duration).
    pub async fn arrive<F>(&self, n: u32, on_last: F)
    where
        F: FnOnce(),
    {
        if n == 0 {
            on_last();
            return;
        }
        let my_epoch = {
            let mut count = self.count.lock();
            *count += 1;
            if *count == n {
                *count = 0;
                drop(count);
                on_last();
                self.epoch.fetch_add(1, Ordering::SeqCst);
                self.notify.notify_waiters();
                return;
            }
            self.epoch.load(Ordering::SeqCst)
        };

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.epoch.load(Ordering::SeqCst) != my_epoch {
                return;
            }
            notified.await;
            if self.epoch.load(Ordering::SeqCst) != my_epoch {
                return;
            }
        }
    }

    /// Current arrival count within the active epoch. Exposed for tests
    /// and for replies that surface in-progress rendezvous counts.
    pub fn waiting(&self) -> u32 {
        *self.count.lock()
    }
}

#[cfg(test)]
mod rendezvous_tests;
