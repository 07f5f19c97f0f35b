// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for driving the pipeline without a platform.
//!
//! - [`TestComponent`] / [`RecordingView`]: a component whose views append
//!   every call they receive to a shared [`EventLog`].
//! - [`ManualDispatcher`]: a [`MainDispatcher`] that parks batches until the
//!   test runs them.
//! - [`ScriptedExecutor`]: an [`AnimationExecutor`] that records requests and
//!   leaves them running, so the test decides when each one finishes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kurbo::Rect;
use serde_json::Value;

use crate::animation::{AnimatedProperty, AnimationExecutor, AnimationRequest, AnimationStatus};
use crate::block::{MainDispatcher, UiBatch, UiBlock};
use crate::component::{Amendment, Component, HostView, Props};
use crate::error::CommandError;
use crate::host::HostContext;
use crate::shadow::ShadowNode;
use crate::tag::Tag;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Something a [`RecordingView`] was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    /// The view was created.
    Created,
    /// `set_props`.
    Props(Props),
    /// `set_frame`.
    Frame(Rect),
    /// `set_animated_property`.
    Animated(AnimatedProperty, f64),
    /// `set_inherited_prop`.
    Inherited(String, Value),
    /// The component's amendment ran.
    Amended,
    /// `batch_did_complete`.
    BatchComplete,
    /// `invalidate`.
    Invalidated,
}

/// Shared, ordered log of view events.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Arc<Mutex<Vec<(Tag, ViewEvent)>>>);

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&self, tag: Tag, event: ViewEvent) {
        lock(&self.0).push((tag, event));
    }

    /// Returns a copy of every event so far.
    #[must_use]
    pub fn events(&self) -> Vec<(Tag, ViewEvent)> {
        lock(&self.0).clone()
    }

    /// Removes and returns every event so far.
    pub fn take(&self) -> Vec<(Tag, ViewEvent)> {
        core::mem::take(&mut *lock(&self.0))
    }

    /// Returns the events of one view.
    #[must_use]
    pub fn for_tag(&self, tag: Tag) -> Vec<ViewEvent> {
        lock(&self.0)
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Returns the frames applied to one view, in order.
    #[must_use]
    pub fn frames(&self, tag: Tag) -> Vec<Rect> {
        self.for_tag(tag)
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Frame(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }
}

/// A view that logs every call.
#[derive(Debug)]
pub struct RecordingView {
    tag: Tag,
    log: EventLog,
    listens: bool,
    rejects_frames: bool,
}

impl HostView for RecordingView {
    fn set_props(&mut self, props: &Props) {
        self.log.push(self.tag, ViewEvent::Props(props.clone()));
    }

    fn set_frame(&mut self, frame: Rect) {
        assert!(!self.rejects_frames, "view {} rejects frames", self.tag);
        self.log.push(self.tag, ViewEvent::Frame(frame));
    }

    fn set_animated_property(&mut self, property: AnimatedProperty, value: f64) {
        self.log.push(self.tag, ViewEvent::Animated(property, value));
    }

    fn set_inherited_prop(&mut self, name: &str, value: &Value) {
        self.log
            .push(self.tag, ViewEvent::Inherited(name.to_owned(), value.clone()));
    }

    fn wants_batch_notifications(&self) -> bool {
        self.listens
    }

    fn batch_did_complete(&mut self) {
        self.log.push(self.tag, ViewEvent::BatchComplete);
    }

    fn invalidate(&mut self) {
        self.log.push(self.tag, ViewEvent::Invalidated);
    }
}

/// A component producing [`RecordingView`]s.
///
/// Command `1` applies its first argument as props, command `2` panics,
/// every other command is unsupported.
#[derive(Debug)]
pub struct TestComponent {
    name: String,
    log: EventLog,
    listens: bool,
    amends: bool,
    amendment_panics: bool,
    rejects_frames: bool,
    pending: Mutex<Option<UiBlock>>,
}

impl TestComponent {
    /// Creates a component named `name` logging to `log`.
    #[must_use]
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_owned(),
            log: log.clone(),
            listens: false,
            amends: false,
            amendment_panics: false,
            rejects_frames: false,
            pending: Mutex::new(None),
        }
    }

    /// Makes every view a transaction listener.
    #[must_use]
    pub fn listening(mut self) -> Self {
        self.listens = true;
        self
    }

    /// Attaches an amendment (logging [`ViewEvent::Amended`]) to every frame
    /// change.
    #[must_use]
    pub fn amending(mut self) -> Self {
        self.amends = true;
        self
    }

    /// Attaches an amendment that panics to every frame change.
    #[must_use]
    pub fn panicking_amendment(mut self) -> Self {
        self.amendment_panics = true;
        self
    }

    /// Makes every view panic in [`set_frame`](HostView::set_frame).
    #[must_use]
    pub fn rejecting_frames(mut self) -> Self {
        self.rejects_frames = true;
        self
    }

    /// Stages a block returned by the next
    /// [`take_pending_block`](Component::take_pending_block).
    pub fn stage_pending_block(&self, block: UiBlock) {
        *lock(&self.pending) = Some(block);
    }
}

impl Component for TestComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_view(&self, tag: Tag) -> Box<dyn HostView> {
        self.log.push(tag, ViewEvent::Created);
        Box::new(RecordingView {
            tag,
            log: self.log.clone(),
            listens: self.listens,
            rejects_frames: self.rejects_frames,
        })
    }

    fn amendment(&self, node: &ShadowNode) -> Option<Amendment> {
        if self.amendment_panics {
            let tag = node.tag();
            return Some(Box::new(move |_view: &mut dyn HostView| {
                panic!("amendment for {tag} always panics");
            }));
        }
        if !self.amends {
            return None;
        }
        let log = self.log.clone();
        let tag = node.tag();
        Some(Box::new(move |_view: &mut dyn HostView| {
            log.push(tag, ViewEvent::Amended);
        }))
    }

    fn take_pending_block(&self) -> Option<UiBlock> {
        lock(&self.pending).take()
    }

    fn dispatch_command(
        &self,
        view: &mut dyn HostView,
        command: u32,
        args: &[Value],
    ) -> Result<(), CommandError> {
        match command {
            1 => {
                let props = args
                    .first()
                    .and_then(Value::as_object)
                    .ok_or_else(|| CommandError::InvalidArguments {
                        command,
                        reason: "expected a props object".to_owned(),
                    })?;
                view.set_props(props);
                Ok(())
            }
            2 => panic!("command 2 always panics"),
            _ => Err(CommandError::Unsupported {
                component: self.name.clone(),
                command,
            }),
        }
    }
}

/// Parks flushed batches until the test runs them.
#[derive(Clone, Debug, Default)]
pub struct ManualDispatcher {
    batches: Arc<Mutex<VecDeque<UiBatch>>>,
}

impl ManualDispatcher {
    /// Creates a dispatcher with no parked batches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of parked batches.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.batches).len()
    }

    /// Takes the oldest parked batch.
    pub fn pop(&self) -> Option<UiBatch> {
        lock(&self.batches).pop_front()
    }

    /// Runs every parked batch on `host`, oldest first, and returns how many
    /// ran.
    pub fn run_all(&self, host: &mut HostContext) -> usize {
        let mut ran = 0;
        while let Some(batch) = self.pop() {
            host.run_batch(batch);
            ran += 1;
        }
        ran
    }
}

impl MainDispatcher for ManualDispatcher {
    fn dispatch(&mut self, batch: UiBatch) {
        lock(&self.batches).push_back(batch);
    }
}

/// Records animation requests and reports every one as running.
#[derive(Clone, Debug, Default)]
pub struct ScriptedExecutor {
    started: Arc<Mutex<Vec<AnimationRequest>>>,
}

impl ScriptedExecutor {
    /// Creates an executor with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every request started so far.
    #[must_use]
    pub fn started(&self) -> Vec<AnimationRequest> {
        lock(&self.started).clone()
    }
}

impl AnimationExecutor for ScriptedExecutor {
    fn start(&mut self, _view: &mut dyn HostView, request: &AnimationRequest) -> AnimationStatus {
        lock(&self.started).push(*request);
        AnimationStatus::Running
    }
}
