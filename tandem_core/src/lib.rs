// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow/host tree synchronization and batched mount pipeline.
//!
//! `tandem_core` keeps a background *shadow* tree in step with a stream of
//! tree-edit commands, lays it out off the main thread, and ships the
//! resulting mutations to a live *host* tree as ordered batches of UI blocks.
//!
//! # Architecture
//!
//! Two execution contexts cooperate. The shadow context owns a [`UiManager`];
//! the main context owns a [`HostContext`]. The only thing that crosses
//! between them is a [`UiBatch`]:
//!
//! ```text
//!   edit commands
//!       │
//!       ▼
//!   UiManager ──► ShadowTree (reconcile, mark dirty)
//!       │
//!       │ batch_did_complete()
//!       ▼
//!   LayoutEngine::layout() ──► FrameUpdate snapshot ──► UiBlockQueue
//!                                                          │ flush()
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   MainDispatcher ──► HostContext::run_batch() ──► HostRegistry / HostView
//!                                                   AnimationExecutor
//! ```
//!
//! **[`shadow`]**: Tag-keyed shadow arena with layout and style dirty
//! tracking, frame commit, and change collection.
//!
//! **[`host`]**: Tag-keyed host arena, the main-context [`HostContext`]
//! that executes batches, and the transaction-listener set.
//!
//! **[`reconcile`]**: The children-diff algorithm, shared by both trees
//! through the [`ChildTree`](reconcile::ChildTree) trait.
//!
//! **[`block`]**: UI block records, the pending queue and the
//! [`MainDispatcher`] seam.
//!
//! **[`animation`]**: Layout-animation configuration, the main-context
//! controller, and the [`AnimationExecutor`](animation::AnimationExecutor)
//! capability.
//!
//! **[`component`]**: The component capability ([`Component`],
//! [`HostView`]) and its name registry.
//!
//! **[`layout`]**: The [`LayoutEngine`](layout::LayoutEngine) capability and
//! the built-in [`AbsoluteLayout`](layout::AbsoluteLayout).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) for observable pipeline
//! events.
//!
//! # Crate features
//!
//! - `testing` (disabled by default): exposes [`testing`] test doubles.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animation;
pub mod block;
pub mod component;
pub mod config;
pub mod dirty;
pub mod error;
pub mod host;
pub mod layout;
pub mod manager;
pub mod reconcile;
pub mod shadow;
pub mod tag;
pub mod trace;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use block::{MainDispatcher, UiBatch, UiBlock};
pub use component::{Component, ComponentRegistry, HostView, Props};
pub use error::UiError;
pub use host::HostContext;
pub use manager::UiManager;
pub use tag::Tag;
