// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io;

/// Errors from the shadow thread and the main queue.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The shadow thread could not be started.
    #[error("failed to spawn the shadow thread")]
    Spawn(#[source] io::Error),
    /// The shadow thread has exited and no longer accepts work.
    #[error("the shadow thread is gone")]
    ShadowGone,
    /// Every dispatcher feeding the main queue was dropped.
    #[error("the main queue is disconnected")]
    Disconnected,
    /// A job panicked on the shadow thread.
    #[error("the shadow thread panicked: {0}")]
    Panicked(String),
}
