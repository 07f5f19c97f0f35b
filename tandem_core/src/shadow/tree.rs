// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag-keyed shadow node registry.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use tracing::error;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::error::UiError;
use crate::reconcile::ChildTree;
use crate::tag::Tag;

use super::node::ShadowNode;

/// One frame produced by a [`LayoutEngine`](crate::layout::LayoutEngine),
/// relative to the node's parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeLayout {
    /// The node the frame belongs to.
    pub tag: Tag,
    /// The computed frame.
    pub frame: Rect,
}

/// Snapshot of one committed frame change.
///
/// `is_new` and `parent_is_new` are captured before any `is_new` flag of
/// the pass is cleared, so a new child of a new parent sees its parent as
/// new.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUpdate {
    /// The node whose frame changed.
    pub tag: Tag,
    /// The new frame, relative to the parent.
    pub frame: Rect,
    /// Whether this is the node's first committed frame.
    pub is_new: bool,
    /// Whether the parent's first frame was committed in the same pass.
    pub parent_is_new: bool,
}

/// The shadow registry: every live [`ShadowNode`], keyed by tag.
pub struct ShadowTree {
    nodes: HashMap<Tag, ShadowNode>,
    dirty: DirtyTracker<u32>,
}

impl core::fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShadowTree")
            .field("len", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Default for ShadowTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Inserts a detached node and marks it dirty on both channels.
    pub(crate) fn insert(&mut self, node: ShadowNode) -> Result<(), UiError> {
        let tag = node.tag;
        if self.nodes.contains_key(&tag) {
            return Err(UiError::DuplicateTag(tag));
        }
        self.nodes.insert(tag, node);
        self.dirty.mark(tag.0, dirty::LAYOUT);
        self.dirty.mark(tag.0, dirty::STYLE);
        Ok(())
    }

    /// Returns the node for `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&ShadowNode> {
        self.nodes.get(&tag)
    }

    pub(crate) fn get_mut(&mut self, tag: Tag) -> Option<&mut ShadowNode> {
        self.nodes.get_mut(&tag)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `root` and its attached descendants in pre-order.
    #[must_use]
    pub fn subtree(&self, root: Tag) -> Vec<Tag> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(tag) = stack.pop() {
            let Some(node) = self.nodes.get(&tag) else {
                continue;
            };
            out.push(tag);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // -- Dirty tracking --

    /// Marks `tag` and every ancestor as needing layout.
    pub(crate) fn mark_layout_dirty(&mut self, tag: Tag) {
        let mut cursor = Some(tag);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get_mut(&current) else {
                break;
            };
            node.layout_dirty = true;
            cursor = node.parent;
        }
        if self.nodes.contains_key(&tag) {
            self.dirty.mark_with(tag.0, dirty::LAYOUT, &EagerPolicy);
        }
    }

    /// Marks `tag` for the style-propagation pass.
    pub(crate) fn mark_style_dirty(&mut self, tag: Tag) {
        if self.nodes.contains_key(&tag) {
            self.dirty.mark(tag.0, dirty::STYLE);
        }
    }

    /// Drains the layout channel and returns the roots that need layout.
    pub(crate) fn drain_layout_roots(&mut self) -> BTreeSet<Tag> {
        self.drain_roots(dirty::LAYOUT)
    }

    /// Drains the style channel and returns the roots that need the
    /// style-propagation pass.
    pub(crate) fn drain_style_roots(&mut self) -> BTreeSet<Tag> {
        self.drain_roots(dirty::STYLE)
    }

    fn drain_roots(&mut self, channel: understory_dirty::Channel) -> BTreeSet<Tag> {
        let keys: Vec<u32> = self
            .dirty
            .drain(channel)
            .affected()
            .deterministic()
            .run()
            .collect();
        keys.into_iter()
            .filter_map(|key| self.nodes.get(&Tag(key)).map(|node| node.root))
            .collect()
    }

    // -- Queries --

    /// Returns whether `tag` is a strict descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant(&self, tag: Tag, ancestor: Tag) -> bool {
        let mut cursor = self.nodes.get(&tag).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Returns the committed frame of `tag` expressed in the coordinate space
    /// of `ancestor`.
    ///
    /// `tag == ancestor` yields the node's size at the origin.
    pub fn frame_relative_to(&self, tag: Tag, ancestor: Tag) -> Result<Rect, UiError> {
        let node = self.nodes.get(&tag).ok_or(UiError::UnknownTag(tag))?;
        if !self.nodes.contains_key(&ancestor) {
            return Err(UiError::UnknownTag(ancestor));
        }
        if tag == ancestor {
            return Ok(Rect::from_origin_size(Point::ORIGIN, node.frame.size()));
        }
        let mut origin = node.frame.origin();
        let mut cursor = node.parent;
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(Rect::from_origin_size(origin, node.frame.size()));
            }
            let Some(parent) = self.nodes.get(&current) else {
                break;
            };
            origin += parent.frame.origin().to_vec2();
            cursor = parent.parent;
        }
        Err(UiError::NotADescendant { tag, ancestor })
    }

    // -- Lifecycle --

    /// Purges the subtree rooted at the root `root`.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent, or if any descendant is itself a root.
    pub(crate) fn purge_root(&mut self, root: Tag) {
        if let Some(node) = self.nodes.get(&root) {
            assert!(
                node.parent.is_none(),
                "root {root} is still attached to {:?}",
                node.parent
            );
        }
        self.purge_subtree(root, root);
    }

    fn purge_subtree(&mut self, tag: Tag, allowed_root: Tag) {
        let Some(mut node) = self.nodes.remove(&tag) else {
            return;
        };
        assert!(
            !node.is_root() || tag == allowed_root,
            "purge reached nested root {tag}"
        );
        node.layout_changed = None;
        self.dirty.remove_key(tag.0);
        for child in core::mem::take(&mut node.children) {
            self.purge_subtree(child, allowed_root);
        }
    }

    // -- Layout commit --

    /// Commits the frames computed for `root` and returns the ones that
    /// changed, in pre-order.
    ///
    /// A node counts as changed when it has never committed a frame or its
    /// frame differs from the committed one. Layout-changed callbacks run
    /// here, synchronously. Every walked node leaves the pass clean.
    pub(crate) fn apply_layout(&mut self, root: Tag, layouts: &[NodeLayout]) -> Vec<FrameUpdate> {
        let computed: HashMap<Tag, Rect> = layouts.iter().map(|l| (l.tag, l.frame)).collect();
        let mut updates = Vec::new();

        for tag in self.subtree(root) {
            let parent_is_new = self
                .nodes
                .get(&tag)
                .and_then(|n| n.parent)
                .and_then(|p| self.nodes.get(&p))
                .is_some_and(|p| p.is_new);
            let Some(node) = self.nodes.get_mut(&tag) else {
                continue;
            };
            node.layout_dirty = false;
            let Some(&frame) = computed.get(&tag) else {
                continue;
            };
            if !node.is_new && node.frame == frame {
                continue;
            }
            node.frame = frame;
            if let Some(callback) = node.layout_changed.as_mut() {
                callback(tag, frame);
            }
            updates.push(FrameUpdate {
                tag,
                frame,
                is_new: node.is_new,
                parent_is_new,
            });
        }

        for update in &updates {
            if let Some(node) = self.nodes.get_mut(&update.tag) {
                node.is_new = false;
            }
        }
        updates
    }
}

impl ChildTree for ShadowTree {
    fn contains(&self, tag: Tag) -> bool {
        self.nodes.contains_key(&tag)
    }

    fn children_of(&self, container: Tag) -> Option<&[Tag]> {
        self.nodes.get(&container).map(|n| n.children.as_slice())
    }

    fn parent_of(&self, tag: Tag) -> Option<Tag> {
        self.nodes.get(&tag).and_then(|n| n.parent)
    }

    fn detach(&mut self, child: Tag) {
        let Some(parent) = self.nodes.get_mut(&child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != child);
        }
        self.dirty.remove_dependency(parent.0, child.0, dirty::LAYOUT);
        self.mark_layout_dirty(parent);
    }

    fn insert_child(&mut self, container: Tag, child: Tag, index: usize) {
        if !self.nodes.contains_key(&child) {
            return;
        }
        let Some(parent) = self.nodes.get_mut(&container) else {
            return;
        };
        let index = index.min(parent.children.len());
        parent.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(container);
        }
        if self
            .dirty
            .add_dependency(container.0, child.0, dirty::LAYOUT)
            .is_err()
        {
            error!(%container, %child, "layout dependency rejected as a cycle");
        }
        self.mark_layout_dirty(child);
    }

    fn purge(&mut self, tag: Tag) {
        self.purge_subtree(tag, Tag(u32::MAX));
    }
}
