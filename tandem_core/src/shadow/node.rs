// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow node record.

use core::fmt;

use kurbo::{Rect, Size};
use serde_json::Value;

use crate::component::Props;
use crate::config::RootSizeFlexibility;
use crate::tag::{ComponentId, Tag};

/// Invoked on the shadow context whenever a node's committed frame changes.
pub type LayoutChangedCallback = Box<dyn FnMut(Tag, Rect) + Send>;

/// One node of the shadow tree.
pub struct ShadowNode {
    pub(crate) tag: Tag,
    pub(crate) component: ComponentId,
    pub(crate) view_name: String,
    pub(crate) root: Tag,

    // -- Topology --
    pub(crate) parent: Option<Tag>,
    pub(crate) children: Vec<Tag>,

    // -- Inputs --
    pub(crate) props: Props,
    pub(crate) explicit_frame: Option<Rect>,
    pub(crate) intrinsic_size: Option<Size>,
    pub(crate) size_flexibility: RootSizeFlexibility,
    pub(crate) layout_changed: Option<LayoutChangedCallback>,

    // -- Committed state --
    pub(crate) frame: Rect,
    pub(crate) is_new: bool,
    pub(crate) layout_dirty: bool,
    pub(crate) inherited: Props,
}

impl fmt::Debug for ShadowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNode")
            .field("tag", &self.tag)
            .field("view_name", &self.view_name)
            .field("root", &self.root)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("frame", &self.frame)
            .field("is_new", &self.is_new)
            .field("layout_dirty", &self.layout_dirty)
            .finish_non_exhaustive()
    }
}

impl ShadowNode {
    /// Creates a detached node. `root` is the tag of the surface the node
    /// belongs to (its own tag for a root).
    pub(crate) fn new(
        tag: Tag,
        component: ComponentId,
        view_name: &str,
        root: Tag,
        props: Props,
    ) -> Self {
        Self {
            tag,
            component,
            view_name: view_name.to_owned(),
            root,
            parent: None,
            children: Vec::new(),
            props,
            explicit_frame: None,
            intrinsic_size: None,
            size_flexibility: RootSizeFlexibility::None,
            layout_changed: None,
            frame: Rect::ZERO,
            is_new: true,
            layout_dirty: true,
            inherited: Props::new(),
        }
    }

    /// Returns the node's tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the interned component id.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the view name the node was created with.
    #[must_use]
    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    /// Returns the tag of the root this node was created under.
    #[must_use]
    pub fn root(&self) -> Tag {
        self.root
    }

    /// Returns whether this node is a root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root == self.tag
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

    /// Returns the accumulated props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns a numeric prop, if present.
    #[must_use]
    pub fn prop_f64(&self, name: &str) -> Option<f64> {
        self.props.get(name).and_then(Value::as_f64)
    }

    /// Returns the frame set through
    /// [`UiManager::set_frame`](crate::UiManager::set_frame), if any.
    #[must_use]
    pub fn explicit_frame(&self) -> Option<Rect> {
        self.explicit_frame
    }

    /// Returns the intrinsic content size, if one was reported.
    #[must_use]
    pub fn intrinsic_content_size(&self) -> Option<Size> {
        self.intrinsic_size
    }

    /// Returns the size flexibility (roots only).
    #[must_use]
    pub fn size_flexibility(&self) -> RootSizeFlexibility {
        self.size_flexibility
    }

    /// Returns the last committed frame, relative to the parent.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Returns whether the node's first frame has not been committed yet.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns whether the node needs layout.
    #[must_use]
    pub fn is_layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    /// Returns the value the style-propagation pass last shipped for an
    /// inherited prop.
    #[must_use]
    pub fn inherited_prop(&self, name: &str) -> Option<&Value> {
        self.inherited.get(name)
    }
}
