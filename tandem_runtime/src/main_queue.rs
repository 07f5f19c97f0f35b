// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch delivery from the shadow thread to the main context.
//!
//! [`channel`] returns a connected pair: the [`ChannelDispatcher`] goes into
//! the [`UiManager`](tandem_core::UiManager), the [`MainQueue`] stays with
//! the main loop, which drains it into its
//! [`HostContext`](tandem_core::HostContext).

use core::fmt;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use tandem_core::{HostContext, MainDispatcher, UiBatch};
use tracing::{trace, warn};

use crate::error::RuntimeError;

/// Creates a connected dispatcher and queue.
#[must_use]
pub fn channel() -> (ChannelDispatcher, MainQueue) {
    let (sender, receiver) = mpsc::channel();
    (ChannelDispatcher { sender }, MainQueue { receiver })
}

/// A [`MainDispatcher`] that sends each batch to a [`MainQueue`].
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<UiBatch>,
}

impl fmt::Debug for ChannelDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDispatcher").finish_non_exhaustive()
    }
}

impl MainDispatcher for ChannelDispatcher {
    fn dispatch(&mut self, batch: UiBatch) {
        let seq = batch.seq();
        if self.sender.send(batch).is_err() {
            warn!(seq, "main queue dropped, discarding batch");
        }
    }
}

/// The main-context end of [`channel`].
pub struct MainQueue {
    receiver: mpsc::Receiver<UiBatch>,
}

impl fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainQueue").finish_non_exhaustive()
    }
}

impl MainQueue {
    /// Runs every batch already delivered, oldest first, without blocking.
    ///
    /// Returns the number of batches run.
    pub fn pump(&mut self, host: &mut HostContext) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(batch) => {
                    run(host, batch);
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Waits for at least one batch, then runs it and every other batch
    /// already delivered.
    ///
    /// Returns [`RuntimeError::Disconnected`] once every dispatcher is gone
    /// and the queue is drained.
    pub fn pump_blocking(&mut self, host: &mut HostContext) -> Result<usize, RuntimeError> {
        let batch = self
            .receiver
            .recv()
            .map_err(|_| RuntimeError::Disconnected)?;
        run(host, batch);
        Ok(1 + self.pump(host))
    }

    /// Like [`pump_blocking`](Self::pump_blocking), but gives up after
    /// `timeout` and returns `Ok(0)`.
    pub fn pump_timeout(
        &mut self,
        host: &mut HostContext,
        timeout: Duration,
    ) -> Result<usize, RuntimeError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(batch) => {
                run(host, batch);
                Ok(1 + self.pump(host))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(0),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RuntimeError::Disconnected),
        }
    }
}

fn run(host: &mut HostContext, batch: UiBatch) {
    trace!(seq = batch.seq(), blocks = batch.len(), "running batch");
    host.run_batch(batch);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tandem_core::{ComponentRegistry, UiBlock};

    use super::*;

    fn batch_of(counter: &Arc<AtomicUsize>, seq: u64) -> UiBatch {
        let counter = Arc::clone(counter);
        UiBatch::new(
            seq,
            vec![UiBlock::custom(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })],
        )
    }

    #[test]
    fn pump_drains_without_blocking() {
        let (mut dispatcher, mut queue) = channel();
        let mut host = HostContext::new(Arc::new(ComponentRegistry::new()));
        assert_eq!(queue.pump(&mut host), 0);

        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.dispatch(batch_of(&counter, 0));
        dispatcher.dispatch(batch_of(&counter, 1));
        assert_eq!(queue.pump(&mut host), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disconnect_is_reported_after_drain() {
        let (mut dispatcher, mut queue) = channel();
        let mut host = HostContext::new(Arc::new(ComponentRegistry::new()));
        let counter = Arc::new(AtomicUsize::new(0));
        dispatcher.dispatch(batch_of(&counter, 0));
        drop(dispatcher);

        assert_eq!(queue.pump_blocking(&mut host).unwrap(), 1);
        assert!(matches!(
            queue.pump_blocking(&mut host),
            Err(RuntimeError::Disconnected)
        ));
    }

    #[test]
    fn timeout_returns_zero() {
        let (_dispatcher, mut queue) = channel();
        let mut host = HostContext::new(Arc::new(ComponentRegistry::new()));
        let ran = queue
            .pump_timeout(&mut host, Duration::from_millis(10))
            .unwrap();
        assert_eq!(ran, 0);
    }

    #[test]
    #[tracing_test::traced_test]
    fn dropped_queue_is_logged() {
        let (mut dispatcher, queue) = channel();
        drop(queue);
        dispatcher.dispatch(UiBatch::new(7, Vec::new()));
        assert!(logs_contain("main queue dropped"));
    }
}
