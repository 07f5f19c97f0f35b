// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the shadow tree.
//!
//! The shadow tree uses multi-channel dirty tracking (via
//! [`understory_dirty`]) keyed by raw tag value.
//!
//! # Propagation semantics
//!
//! - **Propagating upward**: [`LAYOUT`] has dependency edges from parent to
//!   child (the parent depends on its children) and is marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy), so dirtying a node also
//!   dirties every ancestor up to its root. A node's size change can move
//!   siblings and resize ancestors, so the whole root is laid out again.
//!
//! - **Local-only**: [`STYLE`] is marked with the default policy. The
//!   style-propagation pass maps each dirty node to its root and walks that
//!   root from the top, so no edges are needed.
//!
//! # Consumption
//!
//! [`UiManager::batch_did_complete`](crate::UiManager::batch_did_complete)
//! drains both channels once per batch; nothing else reads them.

use understory_dirty::Channel;

/// Props, children, explicit frame or intrinsic size changed.
pub const LAYOUT: Channel = Channel::new(0);

/// Props that feed the style-propagation pass may have changed.
pub const STYLE: Channel = Channel::new(1);
