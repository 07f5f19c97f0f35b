// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-context batch execution.

use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::animation::{
    AnimationExecutor, AnimationId, AnimationRequest, AnimationStatus, AnimationTarget, BarrierId,
    ImmediateExecutor, InFlight, LayoutAnimationConfig, LayoutAnimationController,
};
use crate::block::{LayoutBlock, Measurement, PendingFrame, UiBatch, UiBlock, WindowMeasurement};
use crate::component::{Amendment, Component, ComponentRegistry, HostView};
use crate::error::{BlockError, MeasureError};
use crate::reconcile;
use crate::shadow::FrameUpdate;
use crate::tag::{ComponentId, Tag};
use crate::trace::{
    AnimationCompletedEvent, BatchExecutedEvent, BlockFailedEvent, NoopSink, TraceSink,
};

use super::registry::{HostNode, HostRegistry};

/// The view currently holding the JS responder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Responder {
    /// Responder view.
    pub tag: Tag,
    /// Whether native gesture recognizers are blocked.
    pub block_native: bool,
}

/// Everything UI blocks operate on.
///
/// Owned by the main context. Feed it batches with
/// [`run_batch`](Self::run_batch), and report asynchronous animation ends
/// with [`finish_animation`](Self::finish_animation).
pub struct HostContext {
    registry: HostRegistry,
    components: Arc<ComponentRegistry>,
    animations: LayoutAnimationController,
    executor: Box<dyn AnimationExecutor>,
    responder: Option<Responder>,
    trace: Box<dyn TraceSink>,
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("registry", &self.registry)
            .field("animations", &self.animations)
            .field("responder", &self.responder)
            .finish_non_exhaustive()
    }
}

impl HostContext {
    /// Creates a context that applies animations immediately.
    #[must_use]
    pub fn new(components: Arc<ComponentRegistry>) -> Self {
        Self {
            registry: HostRegistry::new(),
            components,
            animations: LayoutAnimationController::new(),
            executor: Box::new(ImmediateExecutor),
            responder: None,
            trace: Box::new(NoopSink),
        }
    }

    /// Replaces the animation executor.
    #[must_use]
    pub fn with_executor(mut self, executor: impl AnimationExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    /// Replaces the trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace = Box::new(sink);
        self
    }

    /// Returns the host registry.
    #[must_use]
    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Returns the host registry.
    pub fn registry_mut(&mut self) -> &mut HostRegistry {
        &mut self.registry
    }

    /// Returns the component registry shared with the shadow context.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Returns the layout-animation state.
    #[must_use]
    pub fn animations(&self) -> &LayoutAnimationController {
        &self.animations
    }

    /// Returns the current JS responder.
    #[must_use]
    pub fn responder(&self) -> Option<Responder> {
        self.responder
    }

    /// Runs every block of `batch` in order.
    ///
    /// A block that fails or panics is logged and reported to the trace sink;
    /// the remaining blocks still run.
    ///
    /// # Panics
    ///
    /// Panics after reporting a [`BlockError::Fatal`] block. The blocks after
    /// it do not run, since the host tree no longer matches the shadow tree.
    pub fn run_batch(&mut self, batch: UiBatch) {
        let seq = batch.seq();
        let mut executed = 0;
        let mut failed = 0;
        let mut fatal = None;
        for (index, block) in batch.into_blocks().into_iter().enumerate() {
            let kind = block.kind();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(block)))
                .unwrap_or_else(|payload| Err(BlockError::Panicked(panic_message(&*payload))));
            match outcome {
                Ok(()) => executed += 1,
                Err(err) => {
                    failed += 1;
                    error!(seq, index, kind, %err, "UI block failed");
                    let abort = err.is_fatal().then(|| err.to_string());
                    self.trace.on_block_failed(&BlockFailedEvent {
                        seq,
                        index,
                        kind,
                        error: err,
                    });
                    if abort.is_some() {
                        fatal = abort;
                        break;
                    }
                }
            }
        }
        debug!(seq, executed, failed, "batch executed");
        self.trace.on_batch_executed(&BatchExecutedEvent {
            seq,
            executed,
            failed,
        });
        if let Some(reason) = fatal {
            panic!("batch {seq} abandoned: {reason}");
        }
    }

    /// Reports the end of an animation that the executor started with
    /// [`AnimationStatus::Running`].
    pub fn finish_animation(&mut self, id: AnimationId, finished: bool) {
        let Some(flight) = self.animations.untrack(id) else {
            warn!(?id, "completion for unknown animation");
            return;
        };
        self.settle(flight.tag, flight.amendment, flight.barrier, finished);
    }

    fn component(&self, id: ComponentId) -> Result<&dyn Component, BlockError> {
        self.components
            .get(id)
            .ok_or(BlockError::UnknownComponent(id))
    }

    fn execute(&mut self, block: UiBlock) -> Result<(), BlockError> {
        match block {
            UiBlock::RegisterRoot {
                tag,
                component,
                frame,
            } => {
                let mut view = self.component(component)?.create_view(tag);
                view.set_frame(frame);
                let mut node = HostNode::new(tag, tag, component, view);
                node.frame = frame;
                self.registry.insert(node)
            }
            UiBlock::CreateView {
                tag,
                component,
                root,
                props,
            } => {
                let mut view = self.component(component)?.create_view(tag);
                view.set_props(&props);
                self.registry
                    .insert(HostNode::new(tag, root, component, view))
            }
            UiBlock::UpdateView { tag, props } => {
                match self.registry.get_mut(tag) {
                    Some(node) => node.view.set_props(&props),
                    None => warn!(%tag, "props for unknown view dropped"),
                }
                Ok(())
            }
            UiBlock::ManageChildren { container, edit } => {
                reconcile::apply(&mut self.registry, container, &edit).map_err(|err| {
                    if err.is_corruption() {
                        BlockError::Fatal(err)
                    } else {
                        BlockError::Tree(err)
                    }
                })?;
                Ok(())
            }
            UiBlock::SetChildren {
                container,
                children,
            } => {
                reconcile::append(&mut self.registry, container, &children)?;
                Ok(())
            }
            UiBlock::PurgeRoot { tag } => {
                if self
                    .responder
                    .is_some_and(|r| self.registry.get(r.tag).is_some_and(|n| n.root == tag))
                {
                    self.responder = None;
                }
                self.registry.purge_root(tag);
                Ok(())
            }
            UiBlock::Layout(layout) => {
                self.apply_layout(layout);
                Ok(())
            }
            UiBlock::PropagateStyles(updates) => {
                for update in updates {
                    match self.registry.get_mut(update.tag) {
                        Some(node) => node.view.set_inherited_prop(&update.name, &update.value),
                        None => warn!(tag = %update.tag, "style for unknown view dropped"),
                    }
                }
                Ok(())
            }
            UiBlock::PromoteAnimation(group) => {
                self.animations.promote(group);
                Ok(())
            }
            UiBlock::ClearAnimation => {
                self.animations.clear();
                Ok(())
            }
            UiBlock::NotifyBatchComplete => {
                for tag in self.registry.listeners() {
                    if let Some(node) = self.registry.get_mut(tag) {
                        node.view.batch_did_complete();
                    }
                }
                Ok(())
            }
            UiBlock::Measure { tag, callback } => {
                callback(self.measure(tag));
                Ok(())
            }
            UiBlock::MeasureInWindow { tag, callback } => {
                callback(self.measure_in_window(tag));
                Ok(())
            }
            UiBlock::DispatchCommand { tag, command, args } => {
                let Some(node) = self.registry.get_mut(tag) else {
                    warn!(%tag, command, "command for unknown view dropped");
                    return Ok(());
                };
                self.components
                    .get(node.component)
                    .ok_or(BlockError::UnknownComponent(node.component))?
                    .dispatch_command(node.view.as_mut(), command, &args)?;
                Ok(())
            }
            UiBlock::SetResponder { tag, block_native } => {
                self.responder = Some(Responder { tag, block_native });
                Ok(())
            }
            UiBlock::ClearResponder => {
                self.responder = None;
                Ok(())
            }
            UiBlock::Custom(f) => f(self),
        }
    }

    fn measure(&self, tag: Tag) -> Result<Measurement, MeasureError> {
        let node = self.registry.get(tag).ok_or(MeasureError::UnknownView(tag))?;
        let page = self
            .registry
            .origin_in_root(tag)
            .ok_or(MeasureError::UnknownView(tag))?;
        Ok(Measurement {
            x: node.frame.x0,
            y: node.frame.y0,
            width: node.frame.width(),
            height: node.frame.height(),
            page_x: page.x,
            page_y: page.y,
        })
    }

    fn measure_in_window(&self, tag: Tag) -> Result<WindowMeasurement, MeasureError> {
        let node = self.registry.get(tag).ok_or(MeasureError::UnknownView(tag))?;
        let origin = self
            .registry
            .origin_in_window(tag)
            .ok_or(MeasureError::UnknownView(tag))?;
        Ok(WindowMeasurement {
            x: origin.x,
            y: origin.y,
            width: node.frame.width(),
            height: node.frame.height(),
        })
    }

    /// Applies one root's frames.
    ///
    /// The current animation configuration decides, per node, between a
    /// creation animation (new node whose parent is not new), an update
    /// animation (existing node), or an immediate frame change. The batch
    /// callback, if this is the first layout block to capture it, fires once
    /// every node has completed.
    fn apply_layout(&mut self, layout: LayoutBlock) {
        let config = self.animations.current().copied();
        let callback = self.animations.take_callback();
        let barrier = self.animations.open_barrier(layout.nodes.len(), callback);

        for PendingFrame { update, amendment } in layout.nodes {
            let tag = update.tag;
            let applied = panic::catch_unwind(AssertUnwindSafe(|| {
                self.apply_frame(layout.root, config, update, amendment, barrier);
            }));
            if let Err(payload) = applied {
                error!(
                    %tag,
                    root = %layout.root,
                    panic = %panic_message(&*payload),
                    "frame update panicked"
                );
                self.animations.complete(barrier, false);
            }
        }
    }

    /// Applies one node's new frame. Every path counts exactly one
    /// completion against `barrier`, unless it panics first.
    fn apply_frame(
        &mut self,
        root: Tag,
        config: Option<LayoutAnimationConfig>,
        update: FrameUpdate,
        amendment: Option<Amendment>,
        barrier: Option<BarrierId>,
    ) {
        let Some(node) = self.registry.get_mut(update.tag) else {
            warn!(tag = %update.tag, %root, "frame for unknown view dropped");
            self.animations.complete(barrier, true);
            return;
        };
        let previous = node.frame;
        node.frame = update.frame;

        let create = config
            .and_then(|c| c.create.map(|spec| (c.duration_of(&spec), spec)))
            .filter(|_| update.is_new && !update.parent_is_new);
        let change = config
            .and_then(|c| c.update.map(|spec| (c.duration_of(&spec), spec)))
            .filter(|_| !update.is_new);

        if let Some((duration, spec)) = create {
            let property = spec.property;
            node.view.set_frame(update.frame);
            node.view
                .set_animated_property(property, property.initial_value());
            let request = AnimationRequest {
                id: self.animations.next_id(),
                tag: update.tag,
                duration,
                delay: spec.delay,
                kind: spec.kind,
                target: AnimationTarget::Appear {
                    property,
                    from: property.initial_value(),
                    to: property.final_value(),
                },
            };
            let status = self.executor.start(node.view.as_mut(), &request);
            self.after_start(request, status, amendment, barrier);
        } else if let Some((duration, spec)) = change {
            let request = AnimationRequest {
                id: self.animations.next_id(),
                tag: update.tag,
                duration,
                delay: spec.delay,
                kind: spec.kind,
                target: AnimationTarget::Frame {
                    from: previous,
                    to: update.frame,
                },
            };
            let status = self.executor.start(node.view.as_mut(), &request);
            let amended = amend(update.tag, node.view.as_mut(), amendment);
            let status = match status {
                AnimationStatus::Finished(finished) => {
                    AnimationStatus::Finished(finished && amended)
                }
                running => running,
            };
            self.after_start(request, status, None, barrier);
        } else {
            node.view.set_frame(update.frame);
            let amended = amend(update.tag, node.view.as_mut(), amendment);
            self.animations.complete(barrier, amended);
        }
    }

    fn after_start(
        &mut self,
        request: AnimationRequest,
        status: AnimationStatus,
        amendment: Option<Amendment>,
        barrier: Option<BarrierId>,
    ) {
        match status {
            AnimationStatus::Finished(finished) => {
                self.settle(request.tag, amendment, barrier, finished);
            }
            AnimationStatus::Running => self.animations.track(
                request.id,
                InFlight {
                    tag: request.tag,
                    barrier,
                    amendment,
                },
            ),
        }
    }

    fn settle(
        &mut self,
        tag: Tag,
        amendment: Option<Amendment>,
        barrier: Option<BarrierId>,
        finished: bool,
    ) {
        let amended = match (amendment, self.registry.get_mut(tag)) {
            (Some(amendment), Some(node)) => {
                amend(tag, node.view.as_mut(), Some(amendment))
            }
            (Some(_), None) => {
                debug!(%tag, "amendment dropped: view was purged mid-animation");
                true
            }
            (None, _) => true,
        };
        self.trace
            .on_animation_completed(&AnimationCompletedEvent { tag, finished });
        self.animations.complete(barrier, finished && amended);
    }
}

/// Runs `amendment` on `view`, returning `false` if it panicked.
fn amend(tag: Tag, view: &mut dyn HostView, amendment: Option<Amendment>) -> bool {
    let Some(amendment) = amendment else {
        return true;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| amendment(view))) {
        Ok(()) => true,
        Err(payload) => {
            error!(%tag, panic = %panic_message(&*payload), "amendment panicked");
            false
        }
    }
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
