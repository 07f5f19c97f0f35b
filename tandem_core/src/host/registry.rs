// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag-keyed host view registry.

use core::fmt;

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect};

use crate::component::HostView;
use crate::error::BlockError;
use crate::reconcile::ChildTree;
use crate::tag::{ComponentId, Tag};

/// One live view on the main context.
pub struct HostNode {
    pub(crate) tag: Tag,
    pub(crate) root: Tag,
    pub(crate) parent: Option<Tag>,
    pub(crate) children: Vec<Tag>,
    pub(crate) frame: Rect,
    pub(crate) component: ComponentId,
    pub(crate) view: Box<dyn HostView>,
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNode")
            .field("tag", &self.tag)
            .field("root", &self.root)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl HostNode {
    /// Creates a detached node around `view`.
    pub(crate) fn new(tag: Tag, root: Tag, component: ComponentId, view: Box<dyn HostView>) -> Self {
        Self {
            tag,
            root,
            parent: None,
            children: Vec::new(),
            frame: Rect::ZERO,
            component,
            view,
        }
    }

    /// Returns the node's tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the owning root.
    #[must_use]
    pub fn root(&self) -> Tag {
        self.root
    }

    /// Returns the parent's tag, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Tag> {
        self.parent
    }

    /// Returns the ordered child tags.
    #[must_use]
    pub fn children(&self) -> &[Tag] {
        &self.children
    }

    /// Returns the last applied frame, relative to the parent.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Returns the component id.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the platform view.
    pub fn view_mut(&mut self) -> &mut dyn HostView {
        self.view.as_mut()
    }
}

/// The host registry and its transaction-listener set.
#[derive(Default)]
pub struct HostRegistry {
    nodes: HashMap<Tag, HostNode>,
    listeners: HashSet<Tag>,
}

impl fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRegistry")
            .field("len", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HostRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a detached node, subscribing it to batch notifications if its
    /// view asks for them.
    pub(crate) fn insert(&mut self, node: HostNode) -> Result<(), BlockError> {
        let tag = node.tag;
        if self.nodes.contains_key(&tag) {
            return Err(BlockError::DuplicateView(tag));
        }
        if node.view.wants_batch_notifications() {
            self.listeners.insert(tag);
        }
        self.nodes.insert(tag, node);
        Ok(())
    }

    /// Returns the node for `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&HostNode> {
        self.nodes.get(&tag)
    }

    /// Returns the node for `tag`.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut HostNode> {
        self.nodes.get_mut(&tag)
    }

    /// Returns the number of live views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether no view is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether `tag` receives batch notifications.
    #[must_use]
    pub fn is_listener(&self, tag: Tag) -> bool {
        self.listeners.contains(&tag)
    }

    /// Returns the listener tags in ascending order.
    #[must_use]
    pub fn listeners(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.listeners.iter().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Returns the origin of `tag` in its root's coordinate space.
    #[must_use]
    pub fn origin_in_root(&self, tag: Tag) -> Option<Point> {
        self.accumulate(tag, false)
    }

    /// Returns the origin of `tag` in window coordinates, i.e. including the
    /// root's own offset.
    #[must_use]
    pub fn origin_in_window(&self, tag: Tag) -> Option<Point> {
        self.accumulate(tag, true)
    }

    fn accumulate(&self, tag: Tag, include_root: bool) -> Option<Point> {
        let mut node = self.nodes.get(&tag)?;
        let mut origin = Point::ORIGIN;
        loop {
            match node.parent.and_then(|p| self.nodes.get(&p)) {
                Some(parent) => {
                    origin += node.frame.origin().to_vec2();
                    node = parent;
                }
                None => {
                    if include_root || node.tag != node.root {
                        origin += node.frame.origin().to_vec2();
                    }
                    return Some(origin);
                }
            }
        }
    }

    /// Purges the subtree rooted at `root`.
    pub(crate) fn purge_root(&mut self, root: Tag) {
        self.detach(root);
        self.purge(root);
    }
}

impl ChildTree for HostRegistry {
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
    }

    fn purge(&mut self, tag: Tag) {
        let mut stack = vec![tag];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&current) else {
                continue;
            };
            node.view.invalidate();
            stack.extend(node.children.iter().rev());
            self.nodes.remove(&current);
            self.listeners.remove(&current);
        }
    }
}
