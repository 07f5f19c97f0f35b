// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shadow-context orchestrator.
//!
//! [`UiManager`] accepts every tree-edit command, applies it to the
//! [`ShadowTree`] right away, and records the mirrored host mutation as a
//! [`UiBlock`]. [`batch_did_complete`](UiManager::batch_did_complete) closes a
//! batch: it lays out dirty roots, snapshots the changed frames, runs the
//! style-propagation pass, and flushes everything to the
//! [`MainDispatcher`] as one [`UiBatch`](crate::UiBatch).
//!
//! Every method takes `&mut self`. The manager is meant to live on a single
//! serial context (see `tandem_runtime::ShadowThread`), so the shadow tree,
//! root set, block queue and staged animation need no locking.

use core::fmt;
use std::collections::BTreeSet;
use std::sync::Arc;

use kurbo::{Rect, Size};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::animation::{AnimationCallback, AnimationGroup, LayoutAnimationConfig};
use crate::block::{
    LayoutBlock, MainDispatcher, MeasureCallback, PendingFrame, StyleUpdate, UiBlock,
    UiBlockQueue, WindowMeasureCallback,
};
use crate::component::{ComponentRegistry, Props, merge_props};
use crate::config::{RootSizeFlexibility, UiManagerConfig};
use crate::error::{LayoutError, UiError};
use crate::layout::{AbsoluteLayout, LayoutEngine};
use crate::reconcile::{self, ChildTree, ChildrenEdit};
use crate::shadow::{LayoutChangedCallback, ShadowNode, ShadowTree};
use crate::tag::{ComponentId, Tag};
use crate::trace::{BatchFlushedEvent, NoopSink, RootEvent, RootLayoutEvent, TraceSink};

/// Owns the shadow tree and produces UI batches.
pub struct UiManager {
    config: UiManagerConfig,
    components: Arc<ComponentRegistry>,
    shadow: ShadowTree,
    roots: BTreeSet<Tag>,
    queue: UiBlockQueue,
    next_animation: Option<AnimationGroup>,
    layout: Box<dyn LayoutEngine + Send>,
    dispatcher: Box<dyn MainDispatcher>,
    trace: Box<dyn TraceSink + Send>,
    batch_depth: u32,
}

impl fmt::Debug for UiManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiManager")
            .field("config", &self.config)
            .field("shadow", &self.shadow)
            .field("roots", &self.roots)
            .field("queue", &self.queue.len())
            .field("next_animation", &self.next_animation)
            .field("batch_depth", &self.batch_depth)
            .finish_non_exhaustive()
    }
}

impl UiManager {
    /// Creates a manager with the default configuration and the
    /// [`AbsoluteLayout`] engine.
    #[must_use]
    pub fn new(
        components: Arc<ComponentRegistry>,
        dispatcher: impl MainDispatcher + 'static,
    ) -> Self {
        Self {
            config: UiManagerConfig::default(),
            components,
            shadow: ShadowTree::new(),
            roots: BTreeSet::new(),
            queue: UiBlockQueue::new(),
            next_animation: None,
            layout: Box::new(AbsoluteLayout),
            dispatcher: Box::new(dispatcher),
            trace: Box::new(NoopSink),
            batch_depth: 0,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: UiManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the layout engine.
    #[must_use]
    pub fn with_layout_engine(mut self, engine: impl LayoutEngine + Send + 'static) -> Self {
        self.layout = Box::new(engine);
        self
    }

    /// Replaces the trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: impl TraceSink + Send + 'static) -> Self {
        self.trace = Box::new(sink);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &UiManagerConfig {
        &self.config
    }

    /// Returns the component registry.
    #[must_use]
    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    /// Returns the shadow tree.
    #[must_use]
    pub fn shadow(&self) -> &ShadowTree {
        &self.shadow
    }

    /// Returns the registered roots in ascending order.
    pub fn roots(&self) -> impl Iterator<Item = Tag> + '_ {
        self.roots.iter().copied()
    }

    /// Returns whether `tag` is a registered root.
    #[must_use]
    pub fn is_root(&self, tag: Tag) -> bool {
        self.roots.contains(&tag)
    }

    /// Returns the number of blocks waiting for the next flush.
    #[must_use]
    pub fn pending_blocks(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether [`invalidate`](Self::invalidate) was called.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.queue.is_torn_down()
    }

    fn ensure_live(&self) -> Result<(), UiError> {
        if self.queue.is_torn_down() {
            Err(UiError::TornDown)
        } else {
            Ok(())
        }
    }

    fn resolve(&self, view_name: &str) -> Result<ComponentId, UiError> {
        self.components
            .resolve(view_name)
            .ok_or_else(|| UiError::UnknownComponent(view_name.to_owned()))
    }

    fn node_mut(&mut self, tag: Tag) -> Result<&mut ShadowNode, UiError> {
        self.shadow.get_mut(tag).ok_or(UiError::UnknownTag(tag))
    }

    // -- Roots --

    /// Registers a new root surface.
    pub fn register_root(&mut self, tag: Tag, frame: Rect, view_name: &str) -> Result<(), UiError> {
        self.ensure_live()?;
        if !self.config.root_tag_rule.is_root(tag) {
            return Err(UiError::NotARootTag(tag));
        }
        if self.shadow.contains(tag) {
            return Err(UiError::DuplicateTag(tag));
        }
        let component = self.resolve(view_name)?;

        let mut node = ShadowNode::new(tag, component, view_name, tag, Props::new());
        node.explicit_frame = Some(frame);
        node.size_flexibility = self.config.default_size_flexibility;
        self.shadow.insert(node)?;
        self.roots.insert(tag);
        self.queue.push(UiBlock::RegisterRoot {
            tag,
            component,
            frame,
        })?;
        debug!(%tag, view_name, "root registered");
        self.trace.on_root_registered(&RootEvent { root: tag });
        Ok(())
    }

    /// Removes a root and purges its whole subtree on both sides.
    ///
    /// Removing a root that is not registered, including a second removal of
    /// the same tag, returns [`UiError::UnknownRoot`] and changes nothing.
    ///
    /// # Panics
    ///
    /// Panics if the root is attached to a parent or its subtree contains
    /// another root.
    pub fn remove_root(&mut self, tag: Tag) -> Result<(), UiError> {
        self.ensure_live()?;
        if !self.roots.contains(&tag) {
            return Err(UiError::UnknownRoot(tag));
        }
        self.shadow.purge_root(tag);
        self.roots.remove(&tag);
        self.queue.push(UiBlock::PurgeRoot { tag })?;
        debug!(%tag, "root removed");
        self.trace.on_root_removed(&RootEvent { root: tag });
        Ok(())
    }

    /// Changes which dimensions of a root follow its content.
    pub fn set_root_size_flexibility(
        &mut self,
        tag: Tag,
        flexibility: RootSizeFlexibility,
    ) -> Result<(), UiError> {
        if !self.roots.contains(&tag) {
            return Err(UiError::UnknownRoot(tag));
        }
        let node = self.node_mut(tag)?;
        if node.size_flexibility != flexibility {
            node.size_flexibility = flexibility;
            self.shadow.mark_layout_dirty(tag);
        }
        Ok(())
    }

    // -- Nodes --

    /// Creates a detached node under `root`.
    pub fn create_node(
        &mut self,
        tag: Tag,
        view_name: &str,
        root: Tag,
        props: Props,
    ) -> Result<(), UiError> {
        self.ensure_live()?;
        let component = self.resolve(view_name)?;
        if !self.roots.contains(&root) {
            return Err(UiError::UnknownRoot(root));
        }
        if self.shadow.contains(tag) {
            return Err(UiError::DuplicateTag(tag));
        }
        self.shadow.insert(ShadowNode::new(
            tag,
            component,
            view_name,
            root,
            props.clone(),
        ))?;
        self.queue.push(UiBlock::CreateView {
            tag,
            component,
            root,
            props,
        })
    }

    /// Merges `props` into an existing node.
    pub fn update_node(&mut self, tag: Tag, view_name: &str, props: Props) -> Result<(), UiError> {
        self.ensure_live()?;
        self.resolve(view_name)?;
        let node = self.node_mut(tag)?;
        if node.view_name != view_name {
            warn!(%tag, expected = %node.view_name, got = view_name, "update names a different view");
        }
        merge_props(&mut node.props, &props);
        self.shadow.mark_layout_dirty(tag);
        self.shadow.mark_style_dirty(tag);
        self.queue.push(UiBlock::UpdateView { tag, props })
    }

    /// Moves, adds and removes children of `container`.
    ///
    /// The edit is applied to the shadow tree now and replayed on the host
    /// tree in the next batch.
    ///
    /// # Panics
    ///
    /// Panics if `remove_at` or `move_from` reaches past the current
    /// children ([`UiError::CorruptChildren`]), or a removed subtree contains
    /// a root.
    #[tracing::instrument(level = "debug", skip(self, edit))]
    pub fn manage_children(&mut self, container: Tag, edit: ChildrenEdit) -> Result<(), UiError> {
        self.ensure_live()?;
        let result = match reconcile::apply(&mut self.shadow, container, &edit) {
            Ok(result) => result,
            Err(err) if err.is_corruption() => panic!("shadow tree is corrupt: {err}"),
            Err(err) => return Err(err),
        };
        debug!(
            removed = result.removed.len(),
            inserted = result.inserted.len(),
            skipped = result.skipped.len(),
            "children reconciled"
        );
        self.shadow.mark_style_dirty(container);
        self.queue.push(UiBlock::ManageChildren { container, edit })
    }

    /// Appends `children`, in order, to `container`.
    ///
    /// Unknown tags are skipped. The call is rejected without any change if a
    /// child already has a parent, is `container` or one of its ancestors, or
    /// appears twice.
    pub fn set_children(&mut self, container: Tag, children: Vec<Tag>) -> Result<(), UiError> {
        self.ensure_live()?;
        reconcile::append(&mut self.shadow, container, &children)?;
        self.shadow.mark_style_dirty(container);
        self.queue.push(UiBlock::SetChildren {
            container,
            children,
        })
    }

    /// Removes every child of `container`.
    pub fn remove_subviews(&mut self, container: Tag) -> Result<(), UiError> {
        let count = self
            .shadow
            .children_of(container)
            .ok_or(UiError::UnknownTag(container))?
            .len();
        let edit = ChildrenEdit {
            remove_at: (0..count).collect(),
            ..ChildrenEdit::default()
        };
        self.manage_children(container, edit)
    }

    /// Puts `new` in the place of `old`, purging `old`.
    pub fn replace_node(&mut self, old: Tag, new: Tag) -> Result<(), UiError> {
        let node = self.shadow.get(old).ok_or(UiError::UnknownTag(old))?;
        let parent = node.parent.ok_or(UiError::Detached(old))?;
        let index = self
            .shadow
            .children_of(parent)
            .and_then(|children| children.iter().position(|&c| c == old))
            .ok_or(UiError::UnknownTag(old))?;
        self.manage_children(parent, ChildrenEdit::new().removing(index).adding(new, index))
    }

    /// Sends an imperative command to a view's component.
    pub fn dispatch_command(&mut self, tag: Tag, command: u32, args: Vec<Value>) -> Result<(), UiError> {
        self.ensure_live()?;
        if !self.shadow.contains(tag) {
            return Err(UiError::UnknownTag(tag));
        }
        self.queue
            .push(UiBlock::DispatchCommand { tag, command, args })
    }

    // -- Measurement --

    /// Measures a view on the main context in the next batch.
    pub fn measure(&mut self, tag: Tag, callback: MeasureCallback) -> Result<(), UiError> {
        self.queue.push(UiBlock::Measure { tag, callback })
    }

    /// Measures a view in window coordinates on the main context in the next
    /// batch.
    pub fn measure_in_window(
        &mut self,
        tag: Tag,
        callback: WindowMeasureCallback,
    ) -> Result<(), UiError> {
        self.queue.push(UiBlock::MeasureInWindow { tag, callback })
    }

    /// Returns the committed frame of `tag` in the coordinate space of
    /// `ancestor`.
    ///
    /// Fails with [`UiError::NotADescendant`] if `tag` is not inside
    /// `ancestor`.
    pub fn measure_layout_relative_to(&self, tag: Tag, ancestor: Tag) -> Result<Rect, UiError> {
        self.shadow.frame_relative_to(tag, ancestor)
    }

    // -- Layout inputs --

    /// Overrides a node's frame (for a root, its surface frame) and requests
    /// layout.
    pub fn set_frame(&mut self, tag: Tag, frame: Rect) -> Result<(), UiError> {
        self.ensure_live()?;
        let node = self.node_mut(tag)?;
        if node.explicit_frame == Some(frame) {
            return Ok(());
        }
        node.explicit_frame = Some(frame);
        self.shadow.mark_layout_dirty(tag);
        self.set_needs_layout()
    }

    /// Reports a node's intrinsic content size and requests layout.
    pub fn set_intrinsic_content_size(&mut self, tag: Tag, size: Size) -> Result<(), UiError> {
        self.ensure_live()?;
        let node = self.node_mut(tag)?;
        if node.intrinsic_size == Some(size) {
            return Ok(());
        }
        node.intrinsic_size = Some(size);
        self.shadow.mark_layout_dirty(tag);
        self.set_needs_layout()
    }

    /// Installs or clears the callback invoked with every new frame of `tag`.
    pub fn set_layout_changed_callback(
        &mut self,
        tag: Tag,
        callback: Option<LayoutChangedCallback>,
    ) -> Result<(), UiError> {
        self.node_mut(tag)?.layout_changed = callback;
        Ok(())
    }

    // -- Animation and responder --

    /// Stages a layout animation for the next batch.
    ///
    /// A configuration staged earlier and not yet consumed is replaced; its
    /// callback is dropped without firing.
    pub fn configure_next_layout_animation(
        &mut self,
        config: LayoutAnimationConfig,
        callback: Option<AnimationCallback>,
    ) {
        if self.next_animation.is_some() {
            warn!("staged layout animation replaced before it was used");
        }
        self.next_animation = Some(AnimationGroup { config, callback });
    }

    /// Makes `tag` the JS responder.
    pub fn set_js_responder(&mut self, tag: Tag, block_native: bool) -> Result<(), UiError> {
        self.queue.push(UiBlock::SetResponder { tag, block_native })
    }

    /// Clears the JS responder.
    pub fn clear_js_responder(&mut self) -> Result<(), UiError> {
        self.queue.push(UiBlock::ClearResponder)
    }

    // -- Batching --

    /// Opens an outer batch. Until the matching
    /// [`batch_did_complete`](Self::batch_did_complete),
    /// [`set_needs_layout`](Self::set_needs_layout) does nothing.
    ///
    /// Every call must be matched by exactly one `batch_did_complete`, also
    /// when an edit inside the batch is rejected. An unmatched call keeps the
    /// pipeline from running for every later batch.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Requests a layout pass, running it right away unless an outer batch
    /// is open.
    pub fn set_needs_layout(&mut self) -> Result<(), UiError> {
        if self.batch_depth > 0 {
            return Ok(());
        }
        self.run_pipeline()
    }

    /// Closes one outer batch and, once none remains open, runs the
    /// layout-and-mount pipeline and flushes.
    ///
    /// Returns the first layout failure, if any root failed to lay out; the
    /// other roots are still laid out and the batch is still flushed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn batch_did_complete(&mut self) -> Result<(), UiError> {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth > 0 {
            return Ok(());
        }
        self.run_pipeline()
    }

    /// Appends a block to the pending batch.
    pub fn add_block(&mut self, block: UiBlock) -> Result<(), UiError> {
        self.queue.push(block)
    }

    /// Hands every pending block to the dispatcher as one batch.
    pub fn flush(&mut self) {
        let Some(batch) = self.queue.take_batch() else {
            return;
        };
        debug!(seq = batch.seq(), blocks = batch.len(), "flushing batch");
        self.trace.on_batch_flushed(&BatchFlushedEvent {
            seq: batch.seq(),
            blocks: batch.len(),
        });
        self.dispatcher.dispatch(batch);
    }

    /// Tears the manager down: purges every root on both sides, flushes,
    /// and rejects all further work.
    pub fn invalidate(&mut self) {
        if self.queue.is_torn_down() {
            return;
        }
        for root in core::mem::take(&mut self.roots) {
            self.shadow.purge_root(root);
            if self.queue.push(UiBlock::PurgeRoot { tag: root }).is_ok() {
                self.trace.on_root_removed(&RootEvent { root });
            }
        }
        self.next_animation = None;
        self.flush();
        self.queue.tear_down();
        debug!("UI manager invalidated");
    }

    // -- Pipeline --

    fn run_pipeline(&mut self) -> Result<(), UiError> {
        self.ensure_live()?;

        for (_, component) in self.components.iter() {
            if let Some(block) = component.take_pending_block() {
                self.queue.push(block)?;
            }
        }

        let animated = match self.next_animation.take() {
            Some(group) => {
                self.queue.push(UiBlock::PromoteAnimation(group))?;
                true
            }
            None => false,
        };

        let mut failure = None;
        let dirty_roots = self.shadow.drain_layout_roots();
        for root in dirty_roots.intersection(&self.roots).copied().collect::<Vec<_>>() {
            if let Err(err) = self.layout_root(root) {
                error!(%root, %err, "layout failed");
                // Keep the root dirty so the next pass retries it.
                self.shadow.mark_layout_dirty(root);
                failure.get_or_insert(err);
            }
        }

        let style_roots = self.shadow.drain_style_roots();
        let mut styles = Vec::new();
        for root in style_roots.intersection(&self.roots).copied().collect::<Vec<_>>() {
            self.propagate_styles(root, &mut styles);
        }
        if !styles.is_empty() {
            self.queue.push(UiBlock::PropagateStyles(styles))?;
        }

        if animated {
            self.queue.push(UiBlock::ClearAnimation)?;
        }
        self.queue.push(UiBlock::NotifyBatchComplete)?;
        self.flush();

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn layout_root(&mut self, root: Tag) -> Result<(), LayoutError> {
        let layouts = self.layout.layout(&self.shadow, root)?;
        let updates = self.shadow.apply_layout(root, &layouts);
        if updates.is_empty() {
            return Ok(());
        }
        let changed = updates.len();
        let nodes = updates
            .into_iter()
            .map(|update| PendingFrame {
                update,
                amendment: self
                    .shadow
                    .get(update.tag)
                    .and_then(|node| self.components.get(node.component)?.amendment(node)),
            })
            .collect();
        if let Err(err) = self.queue.push(UiBlock::Layout(LayoutBlock { root, nodes })) {
            warn!(%root, %err, "layout block dropped");
        }
        debug!(%root, changed, "root laid out");
        self.trace.on_root_laid_out(&RootLayoutEvent { root, changed });
        Ok(())
    }

    /// Resolves the configured inherited props below `root` and records the
    /// values that differ from what was last shipped.
    fn propagate_styles(&mut self, root: Tag, out: &mut Vec<StyleUpdate>) {
        let names = &self.config.inherited_props;
        let mut stack = vec![(root, Props::new())];
        while let Some((tag, from_parent)) = stack.pop() {
            let Some(node) = self.shadow.get_mut(tag) else {
                continue;
            };
            let mut effective = Props::new();
            for name in names {
                let value = node
                    .props
                    .get(name)
                    .filter(|v| !v.is_null())
                    .or_else(|| from_parent.get(name))
                    .cloned();
                match value {
                    Some(value) => {
                        if node.inherited.get(name) != Some(&value) {
                            node.inherited.insert(name.clone(), value.clone());
                            out.push(StyleUpdate {
                                tag,
                                name: name.clone(),
                                value: value.clone(),
                            });
                        }
                        effective.insert(name.clone(), value);
                    }
                    None => {
                        if node.inherited.remove(name).is_some() {
                            out.push(StyleUpdate {
                                tag,
                                name: name.clone(),
                                value: Value::Null,
                            });
                        }
                    }
                }
            }
            for &child in node.children.iter().rev() {
                stack.push((child, effective.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::HostContext;
    use crate::animation::{AnimatedProperty, AnimationTarget};
    use crate::block::{Measurement, UiBatch, WindowMeasurement};
    use crate::error::{BlockError, MeasureError};
    use crate::testing::{EventLog, ManualDispatcher, ScriptedExecutor, TestComponent, ViewEvent};

    const ROOT: Tag = Tag(1);

    struct Harness {
        ui: UiManager,
        host: HostContext,
        dispatcher: ManualDispatcher,
        log: EventLog,
    }

    impl Harness {
        fn new() -> Self {
            let log = EventLog::new();
            let mut registry = ComponentRegistry::new();
            registry.register(TestComponent::new("Root", &log));
            registry.register(TestComponent::new("View", &log).amending());
            registry.register(TestComponent::new("Listener", &log).listening());
            registry.register(TestComponent::new("Fragile", &log).rejecting_frames());
            registry.register(TestComponent::new("Brittle", &log).panicking_amendment());
            let components = Arc::new(registry);
            let dispatcher = ManualDispatcher::new();
            let mut ui = UiManager::new(Arc::clone(&components), dispatcher.clone());
            ui.register_root(ROOT, Rect::new(0., 0., 320., 480.), "Root")
                .unwrap();
            Self {
                ui,
                host: HostContext::new(components),
                dispatcher,
                log,
            }
        }

        fn with_layout_engine(mut self, engine: impl LayoutEngine + Send + 'static) -> Self {
            self.ui = self.ui.with_layout_engine(engine);
            self
        }

        fn with_executor(mut self, executor: ScriptedExecutor) -> Self {
            let components = Arc::clone(self.ui.components());
            self.host = HostContext::new(components).with_executor(executor);
            self
        }

        /// Closes the batch and runs everything on the host.
        fn sync(&mut self) {
            self.ui.batch_did_complete().unwrap();
            self.dispatcher.run_all(&mut self.host);
        }

        fn view(&mut self, tag: u32, props: serde_json::Value) {
            self.ui
                .create_node(Tag(tag), "View", ROOT, props.as_object().cloned().unwrap())
                .unwrap();
        }

        fn add(&mut self, container: u32, children: &[u32]) {
            self.ui
                .set_children(Tag(container), children.iter().map(|&t| Tag(t)).collect())
                .unwrap();
        }

        fn shadow_children(&self, tag: u32) -> Vec<Tag> {
            self.ui.shadow().children_of(Tag(tag)).unwrap().to_vec()
        }

        fn host_children(&self, tag: u32) -> Vec<Tag> {
            self.host.registry().children_of(Tag(tag)).unwrap().to_vec()
        }
    }

    fn boxed<T: Send + 'static>(slot: &Arc<Mutex<Option<T>>>) -> Box<dyn FnOnce(T) + Send> {
        let slot = Arc::clone(slot);
        Box::new(move |value| *slot.lock().unwrap() = Some(value))
    }

    fn frame_props(x: f64, y: f64, w: f64, h: f64) -> serde_json::Value {
        json!({ "left": x, "top": y, "width": w, "height": h })
    }

    #[test]
    fn register_root_validates_tag_and_component() {
        let mut h = Harness::new();
        let frame = Rect::new(0., 0., 1., 1.);
        assert_eq!(
            h.ui.register_root(Tag(2), frame, "Root"),
            Err(UiError::NotARootTag(Tag(2)))
        );
        assert_eq!(
            h.ui.register_root(ROOT, frame, "Root"),
            Err(UiError::DuplicateTag(ROOT))
        );
        assert_eq!(
            h.ui.register_root(Tag(11), frame, "Nope"),
            Err(UiError::UnknownComponent("Nope".into()))
        );
        assert_eq!(h.ui.roots().collect::<Vec<_>>(), [ROOT]);
    }

    #[test]
    fn first_batch_mounts_the_tree() {
        let mut h = Harness::new();
        h.view(2, frame_props(10., 10., 100., 100.));
        h.view(3, frame_props(5., 5., 20., 20.));
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();

        assert_eq!(h.host.registry().len(), 3);
        assert_eq!(h.host_children(1), [Tag(2)]);
        assert_eq!(h.host_children(2), [Tag(3)]);
        assert_eq!(
            h.host.registry().get(Tag(3)).unwrap().frame(),
            Rect::new(5., 5., 25., 25.)
        );
        // Amendments run after the frame is applied.
        assert_eq!(
            h.log.for_tag(Tag(3))[2..],
            [
                ViewEvent::Frame(Rect::new(5., 5., 25., 25.)),
                ViewEvent::Amended
            ]
        );
    }

    #[test]
    fn shadow_and_host_orders_agree() {
        let mut h = Harness::new();
        for tag in 2..=7 {
            h.view(tag, json!({}));
        }
        h.add(1, &[2, 3, 4, 5]);
        h.sync();

        let edits = [
            ChildrenEdit::new().moving(0, 3).moving(3, 0),
            ChildrenEdit::new().removing(1).adding(Tag(6), 0).adding(Tag(7), 9),
            ChildrenEdit::new().moving(2, 0).removing(0),
        ];
        for edit in edits {
            h.ui.manage_children(ROOT, edit).unwrap();
            h.sync();
            assert_eq!(h.shadow_children(1), h.host_children(1));
        }
        assert_eq!(h.shadow_children(1), [Tag(4), Tag(5), Tag(2), Tag(7)]);
    }

    #[test]
    fn remove_and_add_in_one_edit() {
        let mut h = Harness::new();
        for tag in [2, 3, 4, 5] {
            h.view(tag, json!({}));
        }
        h.add(1, &[2, 3, 4]);
        h.sync();

        let edit = ChildrenEdit::new().removing(2).removing(0).adding(Tag(5), 1);
        h.ui.manage_children(ROOT, edit).unwrap();
        h.sync();

        assert_eq!(h.shadow_children(1), [Tag(3), Tag(5)]);
        assert_eq!(h.host_children(1), [Tag(3), Tag(5)]);
        assert!(h.ui.shadow().get(Tag(2)).is_none());
        assert!(h.host.registry().get(Tag(4)).is_none());
        assert!(h.log.for_tag(Tag(4)).contains(&ViewEvent::Invalidated));
    }

    #[test]
    fn mismatched_edit_is_rejected_without_mutation() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        let pending = h.ui.pending_blocks();

        let edit = ChildrenEdit {
            add_tags: vec![Tag(2)],
            ..ChildrenEdit::default()
        };
        assert!(matches!(
            h.ui.manage_children(ROOT, edit),
            Err(UiError::MismatchedLengths { .. })
        ));
        assert_eq!(h.shadow_children(1), [Tag(2)]);
        assert_eq!(h.ui.pending_blocks(), pending);
    }

    #[test]
    fn attachments_that_break_the_tree_are_rejected() {
        let mut h = Harness::new();
        for tag in [2, 3, 4] {
            h.view(tag, json!({}));
        }
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();
        let pending = h.ui.pending_blocks();

        assert_eq!(
            h.ui.set_children(Tag(2), vec![Tag(2)]),
            Err(UiError::WouldCycle {
                container: Tag(2),
                child: Tag(2),
            })
        );
        assert_eq!(
            h.ui.set_children(Tag(3), vec![Tag(2)]),
            Err(UiError::WouldCycle {
                container: Tag(3),
                child: Tag(2),
            })
        );
        assert_eq!(
            h.ui.set_children(ROOT, vec![Tag(4), Tag(3)]),
            Err(UiError::AlreadyAttached {
                child: Tag(3),
                parent: Tag(2),
            })
        );
        assert_eq!(
            h.ui.set_children(ROOT, vec![Tag(4), Tag(4)]),
            Err(UiError::DuplicateChild {
                container: ROOT,
                child: Tag(4),
            })
        );
        assert_eq!(
            h.ui.manage_children(Tag(3), ChildrenEdit::new().adding(ROOT, 0)),
            Err(UiError::WouldCycle {
                container: Tag(3),
                child: ROOT,
            })
        );

        assert_eq!(h.ui.pending_blocks(), pending);
        assert_eq!(h.shadow_children(1), [Tag(2)]);
        assert_eq!(h.shadow_children(2), [Tag(3)]);
        assert!(h.shadow_children(3).is_empty());
        assert_eq!(h.ui.shadow().get(Tag(4)).unwrap().parent(), None);

        // The tree is still usable.
        h.add(1, &[4]);
        h.sync();
        assert_eq!(h.host_children(1), [Tag(2), Tag(4)]);
    }

    #[test]
    #[should_panic(expected = "shadow tree is corrupt")]
    fn out_of_range_shadow_removal_panics() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        let _ = h.ui.manage_children(ROOT, ChildrenEdit::new().removing(4));
    }

    #[test]
    #[traced_test]
    fn corrupt_host_tree_abandons_the_batch() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        h.sync();

        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let batch = UiBatch::new(
            99,
            vec![
                UiBlock::ManageChildren {
                    container: ROOT,
                    edit: ChildrenEdit::new().removing(3),
                },
                UiBlock::custom(move |_| {
                    *flag.lock().unwrap() = true;
                    Ok(())
                }),
            ],
        );
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            h.host.run_batch(batch);
        }));

        assert!(outcome.is_err());
        assert!(!*ran.lock().unwrap());
        assert!(logs_contain("host tree is corrupt"));
        assert_eq!(h.host_children(1), [Tag(2)]);
    }

    #[test]
    fn sugar_operations() {
        let mut h = Harness::new();
        for tag in [2, 3, 4, 5] {
            h.view(tag, json!({}));
        }
        h.add(1, &[2, 3, 4]);
        h.ui.replace_node(Tag(3), Tag(5)).unwrap();
        h.sync();
        assert_eq!(h.host_children(1), [Tag(2), Tag(5), Tag(4)]);
        assert!(h.host.registry().get(Tag(3)).is_none());

        h.ui.remove_subviews(ROOT).unwrap();
        h.sync();
        assert!(h.host_children(1).is_empty());
        assert_eq!(h.host.registry().len(), 1);

        h.view(6, json!({}));
        assert_eq!(h.ui.replace_node(Tag(6), Tag(7)), Err(UiError::Detached(Tag(6))));
    }

    #[test]
    fn create_node_errors() {
        let mut h = Harness::new();
        assert_eq!(
            h.ui.create_node(Tag(2), "Nope", ROOT, Props::new()),
            Err(UiError::UnknownComponent("Nope".into()))
        );
        assert_eq!(
            h.ui.create_node(Tag(2), "View", Tag(21), Props::new()),
            Err(UiError::UnknownRoot(Tag(21)))
        );
        assert_eq!(
            h.ui.create_node(ROOT, "View", ROOT, Props::new()),
            Err(UiError::DuplicateTag(ROOT))
        );
        assert_eq!(
            h.ui.update_node(Tag(9), "View", Props::new()),
            Err(UiError::UnknownTag(Tag(9)))
        );
    }

    #[test]
    fn update_merges_and_relayouts() {
        let mut h = Harness::new();
        h.view(2, frame_props(0., 0., 10., 10.));
        h.add(1, &[2]);
        h.sync();

        let delta = json!({ "left": 50, "opacity": 0.5 });
        h.ui.update_node(Tag(2), "View", delta.as_object().cloned().unwrap())
            .unwrap();
        h.sync();

        let node = h.ui.shadow().get(Tag(2)).unwrap();
        assert_eq!(node.prop_f64("left"), Some(50.));
        assert_eq!(node.prop_f64("width"), Some(10.));
        assert_eq!(
            h.host.registry().get(Tag(2)).unwrap().frame(),
            Rect::new(50., 0., 60., 10.)
        );
    }

    #[test]
    fn nested_new_nodes_do_not_animate_independently() {
        let executor = ScriptedExecutor::new();
        let mut h = Harness::new().with_executor(executor.clone());
        h.sync();

        h.ui.configure_next_layout_animation(LayoutAnimationConfig::ease_in_ease_out(), None);
        h.view(2, frame_props(0., 0., 100., 100.));
        h.view(3, frame_props(0., 0., 10., 10.));
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();

        let started = executor.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].tag, Tag(2));
        assert!(matches!(
            started[0].target,
            AnimationTarget::Appear {
                property: AnimatedProperty::Opacity,
                ..
            }
        ));
        assert!(
            h.log
                .for_tag(Tag(2))
                .contains(&ViewEvent::Animated(AnimatedProperty::Opacity, 0.0))
        );
        assert_eq!(h.log.frames(Tag(3)), [Rect::new(0., 0., 10., 10.)]);
    }

    #[test]
    fn callback_fires_once_after_all_immediate_completions() {
        let mut h = Harness::new();
        for tag in [2, 3, 4] {
            h.view(tag, json!({}));
        }
        h.add(1, &[2, 3, 4]);
        h.sync();

        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let config = LayoutAnimationConfig {
            create: None,
            update: None,
            ..LayoutAnimationConfig::linear()
        };
        h.ui.configure_next_layout_animation(
            config,
            Some(Box::new(move |done| sink.lock().unwrap().push(done))),
        );
        h.ui.begin_batch();
        for tag in [2, 3, 4] {
            h.ui.set_frame(Tag(tag), Rect::new(0., 0., f64::from(tag), 1.))
                .unwrap();
        }
        h.sync();
        assert_eq!(*fired.lock().unwrap(), [true]);

        h.ui.set_frame(Tag(2), Rect::new(0., 0., 9., 9.)).unwrap();
        h.sync();
        assert_eq!(fired.lock().unwrap().len(), 1);
    }

    #[test]
    fn callback_waits_for_running_animations() {
        let executor = ScriptedExecutor::new();
        let mut h = Harness::new().with_executor(executor.clone());
        h.view(2, frame_props(0., 0., 10., 10.));
        h.view(3, frame_props(0., 20., 10., 10.));
        h.add(1, &[2, 3]);
        h.sync();

        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        h.ui.configure_next_layout_animation(
            LayoutAnimationConfig::ease_in_ease_out(),
            Some(Box::new(move |done| sink.lock().unwrap().push(done))),
        );
        h.ui.begin_batch();
        h.ui.set_frame(Tag(2), Rect::new(5., 0., 15., 10.)).unwrap();
        h.ui.set_frame(Tag(3), Rect::new(5., 20., 15., 30.)).unwrap();
        h.sync();

        let started = executor.started();
        assert_eq!(started.len(), 2);
        assert_eq!(h.host.animations().in_flight(), 2);
        // Update amendments run with the animation, not after it.
        assert_eq!(h.log.for_tag(Tag(2)).last(), Some(&ViewEvent::Amended));

        h.host.finish_animation(started[0].id, true);
        assert!(fired.lock().unwrap().is_empty());
        h.host.finish_animation(started[1].id, false);
        assert_eq!(*fired.lock().unwrap(), [false]);
    }

    fn recorded_callback() -> (Arc<Mutex<Vec<bool>>>, AnimationCallback) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, Box::new(move |done| sink.lock().unwrap().push(done)))
    }

    #[test]
    fn panicking_frame_still_completes_the_batch() {
        let mut h = Harness::new();
        let (fired, callback) = recorded_callback();
        let config = LayoutAnimationConfig {
            create: None,
            update: None,
            ..LayoutAnimationConfig::linear()
        };
        h.ui.configure_next_layout_animation(config, Some(callback));
        h.ui.create_node(Tag(2), "Fragile", ROOT, Props::new())
            .unwrap();
        h.view(3, frame_props(0., 0., 10., 10.));
        h.add(1, &[2, 3]);
        h.sync();

        assert_eq!(*fired.lock().unwrap(), [false]);
        assert_eq!(h.log.frames(Tag(3)), [Rect::new(0., 0., 10., 10.)]);
        assert_eq!(h.host.animations().open_barriers(), 0);
        assert_eq!(h.host_children(1), [Tag(2), Tag(3)]);
    }

    #[test]
    fn panicking_amendment_reports_unfinished() {
        let mut h = Harness::new();
        h.ui.create_node(Tag(2), "Brittle", ROOT, Props::new())
            .unwrap();
        h.view(3, json!({}));
        h.add(1, &[2, 3]);
        h.sync();

        let (fired, callback) = recorded_callback();
        let config = LayoutAnimationConfig {
            create: None,
            update: None,
            ..LayoutAnimationConfig::linear()
        };
        h.ui.configure_next_layout_animation(config, Some(callback));
        h.ui.begin_batch();
        h.ui.set_frame(Tag(2), Rect::new(0., 0., 4., 4.)).unwrap();
        h.ui.set_frame(Tag(3), Rect::new(0., 0., 8., 8.)).unwrap();
        h.sync();

        assert_eq!(*fired.lock().unwrap(), [false]);
        assert_eq!(
            h.host.registry().get(Tag(2)).unwrap().frame(),
            Rect::new(0., 0., 4., 4.)
        );
        assert_eq!(h.host.animations().open_barriers(), 0);
    }

    #[test]
    fn panicking_amendment_at_animation_end_reports_unfinished() {
        let executor = ScriptedExecutor::new();
        let mut h = Harness::new().with_executor(executor.clone());
        h.sync();

        let (fired, callback) = recorded_callback();
        h.ui.configure_next_layout_animation(
            LayoutAnimationConfig::ease_in_ease_out(),
            Some(callback),
        );
        let props = frame_props(0., 0., 5., 5.).as_object().cloned().unwrap();
        h.ui.create_node(Tag(2), "Brittle", ROOT, props).unwrap();
        h.add(1, &[2]);
        h.sync();

        let started = executor.started();
        assert_eq!(started.len(), 1);
        h.host.finish_animation(started[0].id, true);
        assert_eq!(*fired.lock().unwrap(), [false]);
        assert_eq!(h.host.animations().open_barriers(), 0);
    }

    /// Fails the first pass, then lays out like [`AbsoluteLayout`].
    #[derive(Default)]
    struct FailsOnce {
        failed: bool,
    }

    impl LayoutEngine for FailsOnce {
        fn layout(
            &mut self,
            tree: &ShadowTree,
            root: Tag,
        ) -> Result<Vec<crate::shadow::NodeLayout>, LayoutError> {
            if !self.failed {
                self.failed = true;
                return Err(LayoutError::Failed {
                    root,
                    reason: "engine not ready".into(),
                });
            }
            AbsoluteLayout.layout(tree, root)
        }
    }

    #[test]
    #[traced_test]
    fn failed_layout_is_retried_by_the_next_pass() {
        let mut h = Harness::new().with_layout_engine(FailsOnce::default());
        h.view(2, frame_props(0., 0., 10., 10.));
        h.add(1, &[2]);
        assert!(matches!(
            h.ui.batch_did_complete(),
            Err(UiError::Layout(LayoutError::Failed { root: ROOT, .. }))
        ));
        h.dispatcher.run_all(&mut h.host);
        assert!(logs_contain("layout failed"));
        assert!(h.log.frames(Tag(2)).is_empty());

        // No new edits: only the retained dirty state brings the root back.
        h.sync();
        assert_eq!(h.log.frames(Tag(2)), [Rect::new(0., 0., 10., 10.)]);
        assert_eq!(
            h.host.registry().get(Tag(2)).unwrap().frame(),
            Rect::new(0., 0., 10., 10.)
        );
    }

    #[test]
    fn staged_callback_without_changes_is_dropped() {
        let mut h = Harness::new();
        h.sync();

        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        h.ui.configure_next_layout_animation(
            LayoutAnimationConfig::linear(),
            Some(Box::new(move |done| sink.lock().unwrap().push(done))),
        );
        h.sync();
        assert!(fired.lock().unwrap().is_empty());
        assert!(h.host.animations().current().is_none());
    }

    #[test]
    fn remove_root_purges_both_sides_once() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.view(3, json!({}));
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();

        h.ui.remove_root(ROOT).unwrap();
        assert!(h.ui.shadow().is_empty());
        assert_eq!(h.ui.remove_root(ROOT), Err(UiError::UnknownRoot(ROOT)));
        h.sync();
        assert!(h.host.registry().is_empty());
        assert_eq!(h.log.for_tag(Tag(3)).last(), Some(&ViewEvent::Invalidated));
    }

    #[test]
    #[should_panic(expected = "is still attached")]
    fn removing_an_attached_root_panics() {
        let mut h = Harness::new();
        h.ui.register_root(Tag(11), Rect::ZERO, "Root").unwrap();
        h.add(1, &[11]);
        let _ = h.ui.remove_root(Tag(11));
    }

    #[test]
    fn measure_layout_relative_to() {
        let mut h = Harness::new();
        h.view(2, frame_props(10., 10., 100., 100.));
        h.view(3, frame_props(5., 5., 20., 20.));
        h.view(4, frame_props(0., 200., 20., 20.));
        h.add(1, &[2, 4]);
        h.add(2, &[3]);
        h.sync();

        assert_eq!(
            h.ui.measure_layout_relative_to(Tag(3), ROOT),
            Ok(Rect::new(15., 15., 35., 35.))
        );
        assert_eq!(
            h.ui.measure_layout_relative_to(Tag(3), Tag(4)),
            Err(UiError::NotADescendant {
                tag: Tag(3),
                ancestor: Tag(4)
            })
        );
    }

    #[test]
    fn measure_runs_on_the_host() {
        let mut h = Harness::new();
        h.view(2, frame_props(10., 10., 100., 100.));
        h.view(3, frame_props(5., 5., 20., 20.));
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();
        h.ui.set_frame(ROOT, Rect::new(0., 50., 320., 530.)).unwrap();

        let measured = Arc::new(Mutex::new(None));
        let in_window = Arc::new(Mutex::new(None));
        let missing = Arc::new(Mutex::new(None));
        h.ui.measure(Tag(3), boxed(&measured)).unwrap();
        h.ui.measure_in_window(Tag(3), boxed(&in_window)).unwrap();
        h.ui.measure(Tag(99), boxed(&missing)).unwrap();
        h.sync();

        assert_eq!(
            measured.lock().unwrap().take(),
            Some(Ok(Measurement {
                x: 5.,
                y: 5.,
                width: 20.,
                height: 20.,
                page_x: 15.,
                page_y: 15.,
            }))
        );
        assert_eq!(
            in_window.lock().unwrap().take(),
            Some(Ok(WindowMeasurement {
                x: 15.,
                y: 65.,
                width: 20.,
                height: 20.,
            }))
        );
        assert_eq!(
            missing.lock().unwrap().take(),
            Some(Err(MeasureError::UnknownView(Tag(99))))
        );
    }

    #[test]
    fn blocks_added_during_execution_wait_for_next_flush() {
        let mut h = Harness::new();
        h.ui.flush();
        let first = h.dispatcher.pop().unwrap();

        let ran = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ran);
        h.ui.add_block(UiBlock::custom(move |_| {
            sink.lock().unwrap().push("late");
            Ok(())
        }))
        .unwrap();

        h.host.run_batch(first);
        assert!(ran.lock().unwrap().is_empty());
        h.sync();
        assert_eq!(*ran.lock().unwrap(), ["late"]);
    }

    #[traced_test]
    #[test]
    fn failing_blocks_do_not_stop_the_batch() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        h.sync();

        let ran = Arc::new(Mutex::new(0));
        let after = Arc::clone(&ran);
        h.ui.dispatch_command(Tag(2), 2, vec![]).unwrap();
        h.ui.add_block(UiBlock::custom(|_| Err(BlockError::Other("nope".into()))))
            .unwrap();
        h.ui.dispatch_command(Tag(2), 1, vec![json!({ "tint": "red" })])
            .unwrap();
        h.ui.add_block(UiBlock::custom(move |_| {
            *after.lock().unwrap() += 1;
            Ok(())
        }))
        .unwrap();
        h.sync();

        assert_eq!(*ran.lock().unwrap(), 1);
        assert_eq!(
            h.log.for_tag(Tag(2)).last(),
            Some(&ViewEvent::Props(
                json!({ "tint": "red" }).as_object().cloned().unwrap()
            ))
        );
        assert!(logs_contain("UI block failed"));
        assert!(logs_contain("command 2 always panics"));
    }

    #[test]
    fn listeners_hear_every_batch() {
        let mut h = Harness::new();
        h.ui.create_node(Tag(2), "Listener", ROOT, Props::new())
            .unwrap();
        h.sync();
        h.sync();
        let heard = h
            .log
            .for_tag(Tag(2))
            .into_iter()
            .filter(|e| *e == ViewEvent::BatchComplete)
            .count();
        assert_eq!(heard, 2);
    }

    #[test]
    fn inherited_props_flow_down() {
        let mut h = Harness::new();
        h.view(2, json!({ "backgroundColor": "red" }));
        h.view(3, json!({}));
        h.add(1, &[2]);
        h.add(2, &[3]);
        h.sync();
        let red = ViewEvent::Inherited("backgroundColor".into(), json!("red"));
        assert!(h.log.for_tag(Tag(3)).contains(&red));

        h.ui.update_node(
            Tag(2),
            "View",
            json!({ "backgroundColor": null }).as_object().cloned().unwrap(),
        )
        .unwrap();
        h.sync();
        let cleared = ViewEvent::Inherited("backgroundColor".into(), Value::Null);
        assert_eq!(h.log.for_tag(Tag(3)).last(), Some(&cleared));
        assert!(h.ui.shadow().get(Tag(3)).unwrap().inherited_prop("backgroundColor").is_none());
    }

    #[test]
    fn pending_component_blocks_run_first() {
        let log = EventLog::new();
        let component = TestComponent::new("Root", &log);
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        component.stage_pending_block(UiBlock::custom(move |host| {
            sink.lock().unwrap().push(host.registry().len());
            Ok(())
        }));
        let mut registry = ComponentRegistry::new();
        registry.register(component);
        let components = Arc::new(registry);
        let dispatcher = ManualDispatcher::new();
        let mut ui = UiManager::new(Arc::clone(&components), dispatcher.clone());
        let mut host = HostContext::new(components);

        ui.batch_did_complete().unwrap();
        let batch = dispatcher.pop().unwrap();
        let kinds: Vec<_> = batch.blocks().iter().map(UiBlock::kind).collect();
        assert_eq!(kinds, ["custom", "notify_batch_complete"]);
        host.run_batch(batch);
        assert_eq!(*order.lock().unwrap(), [0]);
    }

    #[test]
    fn animation_blocks_bracket_layout() {
        let mut h = Harness::new();
        h.sync();
        h.ui.configure_next_layout_animation(LayoutAnimationConfig::linear(), None);
        h.ui.set_frame(ROOT, Rect::new(0., 0., 100., 100.)).unwrap();

        let batch = h.dispatcher.pop().unwrap();
        let kinds: Vec<_> = batch.blocks().iter().map(UiBlock::kind).collect();
        assert_eq!(
            kinds,
            ["promote_animation", "layout", "clear_animation", "notify_batch_complete"]
        );
    }

    #[test]
    fn outer_batch_defers_layout() {
        let mut h = Harness::new();
        h.sync();
        h.ui.begin_batch();
        h.ui.set_frame(ROOT, Rect::new(0., 0., 10., 10.)).unwrap();
        h.ui.set_intrinsic_content_size(ROOT, Size::new(3., 3.))
            .unwrap();
        assert_eq!(h.dispatcher.pending(), 0);
        h.ui.batch_did_complete().unwrap();
        assert_eq!(h.dispatcher.pending(), 1);
    }

    #[test]
    fn layout_changed_callback_runs_on_the_shadow_side() {
        let mut h = Harness::new();
        h.view(2, frame_props(1., 2., 3., 4.));
        h.add(1, &[2]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        h.ui.set_layout_changed_callback(
            Tag(2),
            Some(Box::new(move |tag, frame| sink.lock().unwrap().push((tag, frame)))),
        )
        .unwrap();
        h.ui.batch_did_complete().unwrap();
        assert_eq!(*seen.lock().unwrap(), [(Tag(2), Rect::new(1., 2., 4., 6.))]);
    }

    #[test]
    fn responder_is_tracked_on_the_host() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        h.ui.set_js_responder(Tag(2), true).unwrap();
        h.sync();
        assert_eq!(h.host.responder().map(|r| r.tag), Some(Tag(2)));
        h.ui.clear_js_responder().unwrap();
        h.sync();
        assert_eq!(h.host.responder(), None);
    }

    #[test]
    fn invalidate_tears_everything_down() {
        let mut h = Harness::new();
        h.view(2, json!({}));
        h.add(1, &[2]);
        h.sync();

        h.ui.invalidate();
        h.dispatcher.run_all(&mut h.host);
        assert!(h.host.registry().is_empty());
        assert!(h.ui.is_torn_down());
        assert_eq!(
            h.ui.add_block(UiBlock::ClearResponder),
            Err(UiError::TornDown)
        );
        assert_eq!(h.ui.batch_did_complete(), Err(UiError::TornDown));
    }
}
