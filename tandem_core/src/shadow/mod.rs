// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow tree data model.
//!
//! A *shadow node* is the background-context record of one node of the
//! declarative UI. Each node has:
//!
//! - An identity ([`Tag`](crate::Tag)) chosen by the producer, and the
//!   [`ComponentId`](crate::tag::ComponentId) resolved from its view name.
//! - Topology: a parent tag and an ordered list of child tags. Children are
//!   always looked up through the [`ShadowTree`], never held by reference,
//!   so the reconciler can detach and reinsert freely.
//! - **Inputs** set by commands: props, an explicit frame, an intrinsic
//!   content size, and (roots only) a size flexibility.
//! - **Committed layout** written by
//!   [`apply_layout`](ShadowTree::apply_layout): the frame last shipped to
//!   the host, and the `is_new` flag that stays set until that first frame.
//!
//! # Dirty tracking
//!
//! Input mutations mark the [`LAYOUT`](crate::dirty::LAYOUT) channel, which
//! propagates to ancestors, and prop changes additionally mark
//! [`STYLE`](crate::dirty::STYLE). See [`dirty`](crate::dirty).

mod node;
mod tree;

pub use node::{LayoutChangedCallback, ShadowNode};
pub use tree::{FrameUpdate, NodeLayout, ShadowTree};
