// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording and JSON export.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event to a
//! shared list of [`RecordedEvent`]s. Clones share the list, so one clone can
//! go into a [`UiManager`](tandem_core::UiManager), another into a
//! [`HostContext`](tandem_core::HostContext), and a third stays with the
//! caller for inspection. [`export`](RecorderSink::export) writes the
//! recording as a JSON array.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tandem_core::trace::{
    AnimationCompletedEvent, BatchExecutedEvent, BatchFlushedEvent, BlockFailedEvent, RootEvent,
    RootLayoutEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// One recorded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// [`TraceSink::on_root_registered`].
    RootRegistered(RootEvent),
    /// [`TraceSink::on_root_removed`].
    RootRemoved(RootEvent),
    /// [`TraceSink::on_root_laid_out`].
    RootLaidOut(RootLayoutEvent),
    /// [`TraceSink::on_batch_flushed`].
    BatchFlushed(BatchFlushedEvent),
    /// [`TraceSink::on_batch_executed`].
    BatchExecuted(BatchExecutedEvent),
    /// [`TraceSink::on_block_failed`].
    BlockFailed(BlockFailedEvent),
    /// [`TraceSink::on_animation_completed`].
    AnimationCompleted(AnimationCompletedEvent),
}

impl RecordedEvent {
    /// Returns the event as a JSON object with a `"name"` field.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::RootRegistered(e) => json!({ "name": "RootRegistered", "root": e.root.0 }),
            Self::RootRemoved(e) => json!({ "name": "RootRemoved", "root": e.root.0 }),
            Self::RootLaidOut(e) => json!({
                "name": "RootLaidOut",
                "root": e.root.0,
                "changed": e.changed,
            }),
            Self::BatchFlushed(e) => json!({
                "name": "BatchFlushed",
                "seq": e.seq,
                "blocks": e.blocks,
            }),
            Self::BatchExecuted(e) => json!({
                "name": "BatchExecuted",
                "seq": e.seq,
                "executed": e.executed,
                "failed": e.failed,
            }),
            Self::BlockFailed(e) => json!({
                "name": "BlockFailed",
                "seq": e.seq,
                "index": e.index,
                "kind": e.kind,
                "error": e.error.to_string(),
            }),
            Self::AnimationCompleted(e) => json!({
                "name": "AnimationCompleted",
                "tag": e.tag.0,
                "finished": e.finished,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: RecordedEvent) {
        self.lock().push(event);
    }

    /// Returns a copy of every event so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().clone()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards every recorded event.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Returns the recording as a JSON array.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.lock().iter().map(RecordedEvent::to_json).collect())
    }

    /// Writes the recording to `writer` as a pretty-printed JSON array.
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())?;
        Ok(())
    }
}

impl TraceSink for RecorderSink {
    fn on_root_registered(&mut self, e: &RootEvent) {
        self.record(RecordedEvent::RootRegistered(*e));
    }

    fn on_root_removed(&mut self, e: &RootEvent) {
        self.record(RecordedEvent::RootRemoved(*e));
    }

    fn on_root_laid_out(&mut self, e: &RootLayoutEvent) {
        self.record(RecordedEvent::RootLaidOut(*e));
    }

    fn on_batch_flushed(&mut self, e: &BatchFlushedEvent) {
        self.record(RecordedEvent::BatchFlushed(*e));
    }

    fn on_batch_executed(&mut self, e: &BatchExecutedEvent) {
        self.record(RecordedEvent::BatchExecuted(*e));
    }

    fn on_block_failed(&mut self, e: &BlockFailedEvent) {
        self.record(RecordedEvent::BlockFailed(e.clone()));
    }

    fn on_animation_completed(&mut self, e: &AnimationCompletedEvent) {
        self.record(RecordedEvent::AnimationCompleted(*e));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kurbo::Rect;
    use tandem_core::testing::{EventLog, ManualDispatcher, TestComponent};
    use tandem_core::{ComponentRegistry, HostContext, Props, Tag, UiBlock, UiManager};

    use super::*;

    #[test]
    fn records_both_contexts() {
        let log = EventLog::new();
        let mut registry = ComponentRegistry::new();
        registry.register(TestComponent::new("Root", &log));
        registry.register(TestComponent::new("View", &log));
        let components = Arc::new(registry);

        let recorder = RecorderSink::new();
        let dispatcher = ManualDispatcher::new();
        let mut ui = UiManager::new(Arc::clone(&components), dispatcher.clone())
            .with_trace_sink(recorder.clone());
        let mut host = HostContext::new(components).with_trace_sink(recorder.clone());

        ui.begin_batch();
        ui.register_root(Tag(1), Rect::new(0., 0., 100., 100.), "Root")
            .unwrap();
        ui.create_node(Tag(2), "View", Tag(1), Props::new()).unwrap();
        ui.set_children(Tag(1), vec![Tag(2)]).unwrap();
        ui.add_block(UiBlock::custom(|_| panic!("custom block exploded")))
            .unwrap();
        ui.batch_did_complete().unwrap();
        dispatcher.run_all(&mut host);

        let events = recorder.events();
        assert_eq!(events[0], RecordedEvent::RootRegistered(RootEvent { root: Tag(1) }));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, RecordedEvent::RootLaidOut(l) if l.root == Tag(1))),
            "{events:?}"
        );
        assert!(
            events.iter().any(|e| matches!(
                e,
                RecordedEvent::BlockFailed(f) if f.kind == "custom"
            )),
            "{events:?}"
        );
        assert!(
            matches!(
                events.last(),
                Some(RecordedEvent::BatchExecuted(BatchExecutedEvent { failed: 1, .. }))
            ),
            "{events:?}"
        );
    }

    #[test]
    fn export_produces_valid_json() {
        let mut recorder = RecorderSink::new();
        recorder.on_batch_flushed(&BatchFlushedEvent { seq: 3, blocks: 2 });
        recorder.on_animation_completed(&AnimationCompletedEvent {
            tag: Tag(7),
            finished: true,
        });

        let mut out = Vec::new();
        recorder.export(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "BatchFlushed");
        assert_eq!(parsed[0]["seq"], 3);
        assert_eq!(parsed[1]["name"], "AnimationCompleted");
        assert_eq!(parsed[1]["tag"], 7);
    }

    #[test]
    fn clear_empties_every_clone() {
        let mut recorder = RecorderSink::new();
        let view = recorder.clone();
        recorder.on_root_removed(&RootEvent { root: Tag(1) });
        assert_eq!(view.len(), 1);
        view.clear();
        assert!(recorder.is_empty());
    }
}
