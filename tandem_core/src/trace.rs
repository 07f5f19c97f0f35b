// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable pipeline events.
//!
//! This module provides a [`TraceSink`] trait with per-event methods. The
//! [`UiManager`](crate::UiManager) reports shadow-side events (roots, layout
//! commits, flushes) and the [`HostContext`](crate::HostContext) reports
//! main-side events (batch execution, block failures, animation ends). All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! Diagnostic text goes through `tracing`; sinks are for structured,
//! machine-checkable events.

use crate::error::BlockError;
use crate::tag::Tag;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a root is registered or removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootEvent {
    /// The root's tag.
    pub root: Tag,
}

/// Emitted after a root's frames were committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootLayoutEvent {
    /// The root that was laid out.
    pub root: Tag,
    /// Number of nodes whose frame changed.
    pub changed: usize,
}

/// Emitted when the shadow context hands a batch to the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchFlushedEvent {
    /// Batch sequence number.
    pub seq: u64,
    /// Number of blocks in the batch.
    pub blocks: usize,
}

/// Emitted after the main context ran every block of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchExecutedEvent {
    /// Batch sequence number.
    pub seq: u64,
    /// Blocks that returned `Ok`.
    pub executed: usize,
    /// Blocks that returned `Err` or panicked.
    pub failed: usize,
}

/// Emitted for each block that returned `Err` or panicked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockFailedEvent {
    /// Batch sequence number.
    pub seq: u64,
    /// Position of the block in its batch.
    pub index: usize,
    /// [`UiBlock::kind`](crate::UiBlock::kind) of the block.
    pub kind: &'static str,
    /// What went wrong.
    pub error: BlockError,
}

/// Emitted when a started layout animation ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationCompletedEvent {
    /// The animated view.
    pub tag: Tag,
    /// `false` if the animation was interrupted.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives pipeline events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a root was registered.
    fn on_root_registered(&mut self, e: &RootEvent) {
        _ = e;
    }

    /// Called after a root was removed.
    fn on_root_removed(&mut self, e: &RootEvent) {
        _ = e;
    }

    /// Called after a root with at least one changed frame was laid out.
    fn on_root_laid_out(&mut self, e: &RootLayoutEvent) {
        _ = e;
    }

    /// Called when a batch is handed to the dispatcher.
    fn on_batch_flushed(&mut self, e: &BatchFlushedEvent) {
        _ = e;
    }

    /// Called after a batch ran on the main context.
    fn on_batch_executed(&mut self, e: &BatchExecutedEvent) {
        _ = e;
    }

    /// Called for each failed block.
    fn on_block_failed(&mut self, e: &BlockFailedEvent) {
        _ = e;
    }

    /// Called when a layout animation ends.
    fn on_animation_completed(&mut self, e: &AnimationCompletedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}
