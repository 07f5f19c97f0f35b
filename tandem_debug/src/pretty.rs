// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).
//!
//! The default boxed writer is not `Send`, so a sink handed to a
//! [`UiManager`](tandem_core::UiManager) should use
//! [`with_writer`](PrettyPrintSink::with_writer) with a `Send` writer such as
//! [`std::io::stderr()`].

use std::io::Write;

use tandem_core::trace::{
    AnimationCompletedEvent, BatchExecutedEvent, BatchFlushedEvent, BlockFailedEvent, RootEvent,
    RootLayoutEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_root_registered(&mut self, e: &RootEvent) {
        let _ = writeln!(self.writer, "[root:add] root={}", e.root);
    }

    fn on_root_removed(&mut self, e: &RootEvent) {
        let _ = writeln!(self.writer, "[root:remove] root={}", e.root);
    }

    fn on_root_laid_out(&mut self, e: &RootLayoutEvent) {
        let _ = writeln!(
            self.writer,
            "[layout] root={} changed={}",
            e.root, e.changed,
        );
    }

    fn on_batch_flushed(&mut self, e: &BatchFlushedEvent) {
        let _ = writeln!(self.writer, "[flush] seq={} blocks={}", e.seq, e.blocks);
    }

    fn on_batch_executed(&mut self, e: &BatchExecutedEvent) {
        let status = if e.failed == 0 { "ok" } else { "FAILED" };
        let _ = writeln!(
            self.writer,
            "[batch] seq={} executed={} failed={} {status}",
            e.seq, e.executed, e.failed,
        );
    }

    fn on_block_failed(&mut self, e: &BlockFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[block:error] seq={} #{} {}: {}",
            e.seq, e.index, e.kind, e.error,
        );
    }

    fn on_animation_completed(&mut self, e: &AnimationCompletedEvent) {
        let outcome = if e.finished { "finished" } else { "interrupted" };
        let _ = writeln!(self.writer, "[animation] tag={} {outcome}", e.tag);
    }
}
