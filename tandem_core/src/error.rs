// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Contract violations by the edit-command producer surface as [`UiError`]
//! before any registry is touched. Failures inside a UI block surface as
//! [`BlockError`]; the batch runner logs them and moves on to the next block.
//! Tree corruption ([`UiError::CorruptChildren`]) is fatal: the shadow side
//! panics on it, and the host side reports [`BlockError::Fatal`] and abandons
//! the batch.

use thiserror::Error;

use crate::tag::{ComponentId, Tag};

/// A rejected tree-edit command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UiError {
    /// No component is registered under the given view name.
    #[error("no component registered under `{0}`")]
    UnknownComponent(String),
    /// The tag does not resolve in the registry being edited.
    #[error("no node with tag {0}")]
    UnknownTag(Tag),
    /// The tag is not a registered root.
    #[error("tag {0} is not a registered root")]
    UnknownRoot(Tag),
    /// The tag is already in use.
    #[error("tag {0} is already registered")]
    DuplicateTag(Tag),
    /// The node has no parent, so it cannot be replaced in place.
    #[error("node {0} is not attached to a parent")]
    Detached(Tag),
    /// The tag does not satisfy the configured root tag rule.
    #[error("tag {0} does not follow the root tag rule")]
    NotARootTag(Tag),
    /// Two parallel argument lists differ in length.
    #[error("{what}: lists differ in length ({left} vs {right})")]
    MismatchedLengths {
        /// Which pair of lists was mismatched.
        what: &'static str,
        /// Length of the first list.
        left: usize,
        /// Length of the second list.
        right: usize,
    },
    /// The node is not inside the subtree of the requested ancestor.
    #[error("tag {tag} is not a descendant of {ancestor}")]
    NotADescendant {
        /// The measured node.
        tag: Tag,
        /// The requested ancestor.
        ancestor: Tag,
    },
    /// Attaching the child would make a node its own ancestor.
    #[error("attaching {child} under {container} would create a cycle")]
    WouldCycle {
        /// The prospective parent.
        container: Tag,
        /// The node being attached.
        child: Tag,
    },
    /// The child already has a parent that the edit does not detach it from.
    #[error("node {child} is already attached to {parent}")]
    AlreadyAttached {
        /// The node being attached.
        child: Tag,
        /// Its current parent.
        parent: Tag,
    },
    /// One edit attaches the same child twice.
    #[error("node {child} is attached to {container} twice in one edit")]
    DuplicateChild {
        /// The container being edited.
        container: Tag,
        /// The repeated child.
        child: Tag,
    },
    /// An index set did not fully resolve against the current children.
    ///
    /// The caller's view of the tree has diverged from the tree itself.
    #[error(
        "{what} set of container {container} resolved {resolved} children but {requested} were requested"
    )]
    CorruptChildren {
        /// The container being edited.
        container: Tag,
        /// Which index set, `remove` or `move`.
        what: &'static str,
        /// How many indices resolved.
        resolved: usize,
        /// How many indices were requested.
        requested: usize,
    },
    /// The manager was invalidated and accepts no further work.
    #[error("the UI manager has been torn down")]
    TornDown,
    /// The layout engine failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// A layout engine failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The engine could not lay out the given root.
    #[error("layout of root {root} failed: {reason}")]
    Failed {
        /// The root being laid out.
        root: Tag,
        /// Engine-provided description.
        reason: String,
    },
}

/// A failure raised by a component while handling an imperative command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The component does not implement the command.
    #[error("command {command} is not supported by `{component}`")]
    Unsupported {
        /// Name of the component.
        component: String,
        /// Command identifier.
        command: u32,
    },
    /// The command arguments were rejected.
    #[error("invalid arguments for command {command}: {reason}")]
    InvalidArguments {
        /// Command identifier.
        command: u32,
        /// Why the arguments were rejected.
        reason: String,
    },
}

/// A failure inside a single UI block.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// A view with this tag already exists in the host registry.
    #[error("host view {0} already exists")]
    DuplicateView(Tag),
    /// The component id is not registered with this host.
    #[error("component {0:?} is not registered with this host")]
    UnknownComponent(ComponentId),
    /// The host tree no longer matches the edits sent to it. The rest of
    /// the batch is abandoned.
    #[error("host tree is corrupt: {0}")]
    Fatal(UiError),
    /// The block panicked.
    #[error("block panicked: {0}")]
    Panicked(String),
    /// A tree edit was rejected by the host registry.
    #[error(transparent)]
    Tree(#[from] UiError),
    /// A component command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Any other failure reported by a custom block.
    #[error("{0}")]
    Other(String),
}

/// A failed measurement.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeasureError {
    /// The view does not exist on the main context.
    #[error("no view with tag {0}")]
    UnknownView(Tag),
}

impl UiError {
    /// Returns whether the error means the tree itself is corrupt, as
    /// opposed to a rejected command.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptChildren { .. })
    }
}

impl BlockError {
    /// Returns whether the batch must stop at this block.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
