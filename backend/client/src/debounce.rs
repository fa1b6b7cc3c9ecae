//! Cancel-and-replace debouncing.
//!
//! A [`Debouncer`] owns at most one pending task. Every call aborts the
//! previous task and hands the new one a [`Ticket`]; a ticket stays current
//! until a later call or [`Debouncer::cancel`], so work that outlives its
//! turn can check before publishing anything.
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};

#[derive(Clone, Debug)]
pub struct Ticket {
    token: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.token
    }
}

pub struct Debouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` once `delay` passes without another call.
    pub fn call<F, Fut>(&mut self, task: F) -> Ticket
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_pending();

        let ticket = self.issue();
        let delay = self.delay;
        let handed = ticket.clone();

        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;

            if handed.is_current() {
                task(handed).await;
            }
        }));

        ticket
    }

    /// Drops the pending task and invalidates every outstanding ticket.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.issue();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn issue(&self) -> Ticket {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        Ticket {
            token,
            latest: self.latest.clone(),
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
