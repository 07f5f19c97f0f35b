// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The serial shadow context.
//!
//! [`ShadowThread::spawn`] moves a [`UiManager`] onto a thread named
//! `tandem-shadow`. Every edit reaches it as a closure sent over an `mpsc`
//! channel, so commands from any number of [`ShadowHandle`]s run one at a
//! time, in the order they were sent.

use core::any::Any;
use core::fmt;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tandem_core::UiManager;
use tracing::{debug, warn};

use crate::error::RuntimeError;

type Job = Box<dyn FnOnce(&mut UiManager) + Send>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Owns the shadow thread.
///
/// Dropping it shuts the thread down and waits for it, like
/// [`shutdown`](Self::shutdown) but discarding the outcome.
pub struct ShadowThread {
    handle: ShadowHandle,
    join: Option<JoinHandle<()>>,
}

impl fmt::Debug for ShadowThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowThread")
            .field("running", &self.join.is_some())
            .finish_non_exhaustive()
    }
}

impl ShadowThread {
    /// Moves `manager` onto a new shadow thread.
    pub fn spawn(manager: UiManager) -> Result<Self, RuntimeError> {
        let (tx, rx) = mpsc::channel::<Message>();
        let join = thread::Builder::new()
            .name("tandem-shadow".into())
            .spawn(move || shadow_loop(manager, &rx))
            .map_err(RuntimeError::Spawn)?;
        Ok(Self {
            handle: ShadowHandle { sender: tx },
            join: Some(join),
        })
    }

    /// Returns a handle for sending work to the thread.
    #[must_use]
    pub fn handle(&self) -> ShadowHandle {
        self.handle.clone()
    }

    /// Invalidates the manager, stops the thread and waits for it.
    ///
    /// Work sent before the shutdown still runs first. Returns
    /// [`RuntimeError::Panicked`] if a job panicked.
    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), RuntimeError> {
        let _ = self.handle.sender.send(Message::Shutdown);
        match self.join.take() {
            Some(join) => join
                .join()
                .map_err(|payload| RuntimeError::Panicked(panic_message(&*payload))),
            None => Ok(()),
        }
    }
}

impl Drop for ShadowThread {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(%err, "shadow thread ended abnormally");
        }
    }
}

/// A cloneable sender of work for the shadow thread.
#[derive(Clone)]
pub struct ShadowHandle {
    sender: mpsc::Sender<Message>,
}

impl fmt::Debug for ShadowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowHandle").finish_non_exhaustive()
    }
}

impl ShadowHandle {
    /// Queues `job` to run on the shadow thread and returns immediately.
    pub fn run<F>(&self, job: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut UiManager) + Send + 'static,
    {
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| RuntimeError::ShadowGone)
    }

    /// Runs `job` on the shadow thread and waits for its result.
    ///
    /// Must not be called from the shadow thread itself; the reply could
    /// never arrive.
    pub fn call<F, R>(&self, job: F) -> Result<R, RuntimeError>
    where
        F: FnOnce(&mut UiManager) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.run(move |ui| {
            let _ = reply_tx.send(job(ui));
        })?;
        reply_rx.recv().map_err(|_| RuntimeError::ShadowGone)
    }
}

fn shadow_loop(mut manager: UiManager, rx: &mpsc::Receiver<Message>) {
    debug!("shadow thread started");
    while let Ok(message) = rx.recv() {
        match message {
            Message::Run(job) => job(&mut manager),
            Message::Shutdown => break,
        }
    }
    manager.invalidate();
    debug!("shadow thread stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
