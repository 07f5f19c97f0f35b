// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout engine capability.
//!
//! The pipeline does not lay anything out itself. For each dirty root it asks
//! a [`LayoutEngine`] for the frame of every node of that root, then commits
//! the results with [`ShadowTree::apply_layout`], which is where "did this
//! frame change" is decided.
//!
//! [`AbsoluteLayout`] is the built-in engine. It places nodes at explicit
//! coordinates and does no flow layout at all.

use kurbo::{Rect, Size};

use crate::error::LayoutError;
use crate::shadow::{NodeLayout, ShadowNode, ShadowTree};
use crate::tag::Tag;

/// Computes frames for a root and its descendants.
pub trait LayoutEngine {
    /// Returns a frame, relative to its parent, for `root` and every node
    /// attached below it. Nodes left out keep their committed frame.
    fn layout(&mut self, tree: &ShadowTree, root: Tag) -> Result<Vec<NodeLayout>, LayoutError>;
}

/// Positions nodes from explicit coordinates.
///
/// For each non-root node, in order of precedence:
///
/// 1. The frame given to [`UiManager::set_frame`](crate::UiManager::set_frame).
/// 2. Numeric `left`, `top`, `width`, `height` props. A missing `width` or
///    `height` falls back to the intrinsic content size, then to zero.
///
/// A root takes its registered frame; a dimension marked flexible by its
/// [`RootSizeFlexibility`](crate::config::RootSizeFlexibility) grows to
/// enclose the root's direct children instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsoluteLayout;

impl AbsoluteLayout {
    fn frame_of(node: &ShadowNode) -> Rect {
        if let Some(frame) = node.explicit_frame() {
            return frame;
        }
        let intrinsic = node.intrinsic_content_size().unwrap_or(Size::ZERO);
        let x = node.prop_f64("left").unwrap_or(0.0);
        let y = node.prop_f64("top").unwrap_or(0.0);
        let width = node.prop_f64("width").unwrap_or(intrinsic.width);
        let height = node.prop_f64("height").unwrap_or(intrinsic.height);
        Rect::from_origin_size((x, y), (width.max(0.0), height.max(0.0)))
    }
}

impl LayoutEngine for AbsoluteLayout {
    fn layout(&mut self, tree: &ShadowTree, root: Tag) -> Result<Vec<NodeLayout>, LayoutError> {
        let root_node = tree.get(root).ok_or_else(|| LayoutError::Failed {
            root,
            reason: "root is not in the shadow tree".to_owned(),
        })?;

        let mut out = Vec::with_capacity(tree.len());
        let mut extent = Size::ZERO;
        for tag in tree.subtree(root).into_iter().skip(1) {
            let Some(node) = tree.get(tag) else {
                continue;
            };
            let frame = Self::frame_of(node);
            if node.parent() == Some(root) {
                extent.width = extent.width.max(frame.x1);
                extent.height = extent.height.max(frame.y1);
            }
            out.push(NodeLayout { tag, frame });
        }

        let mut frame = root_node.explicit_frame().unwrap_or(Rect::ZERO);
        let flexibility = root_node.size_flexibility();
        if flexibility.width() {
            frame.x1 = frame.x0 + extent.width;
        }
        if flexibility.height() {
            frame.y1 = frame.y0 + extent.height;
        }
        out.insert(0, NodeLayout { tag: root, frame });
        Ok(out)
    }
}
