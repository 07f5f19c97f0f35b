// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The children reconciler.
//!
//! [`apply`] edits one container's ordered child list with a batch of
//! *move*, *add* and *remove* requests. It is replayed twice per command:
//! immediately against the [`ShadowTree`](crate::shadow::ShadowTree) and
//! later, inside a UI block, against the
//! [`HostRegistry`](crate::host::HostRegistry). Both trees implement
//! [`ChildTree`], so the two replays run the same code and end with the same
//! child order.
//!
//! # Algorithm
//!
//! 1. Resolve `remove_at` and `move_from` against the **pre-mutation** child
//!    list. Indices past the end resolve to nothing; a resolved list shorter
//!    than its request means the two trees disagree, reported as
//!    [`UiError::CorruptChildren`].
//! 2. Check every attachment before mutating anything: no tag may be
//!    attached twice, become its own ancestor, or keep a second parent.
//! 3. Detach both sets. They are tags now, not indices, so detach order is
//!    irrelevant.
//! 4. Purge the removed subtrees. Moved nodes stay alive.
//! 5. Key moved tags by `move_to` and added tags by `add_at`. Added tags that
//!    no longer resolve are skipped.
//! 6. Insert in ascending destination order, so earlier insertions are never
//!    shifted by later ones. A destination past the end appends.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use tracing::warn;

use crate::error::UiError;
use crate::tag::Tag;

/// An ordered tree addressable by tag, editable by the reconciler.
pub trait ChildTree {
    /// Returns whether `tag` is present.
    fn contains(&self, tag: Tag) -> bool;

    /// Returns the ordered children of `container`, or `None` if it is
    /// unknown.
    fn children_of(&self, container: Tag) -> Option<&[Tag]>;

    /// Returns the parent of `tag`, or `None` if it is detached or unknown.
    fn parent_of(&self, tag: Tag) -> Option<Tag>;

    /// Detaches `child` from its parent, if it has one.
    fn detach(&mut self, child: Tag);

    /// Inserts a detached `child` into `container` at `index`, clamped to the
    /// current child count.
    fn insert_child(&mut self, container: Tag, child: Tag, index: usize);

    /// Recursively removes a detached subtree from the registry, releasing
    /// each node before its entry is dropped.
    fn purge(&mut self, tag: Tag);
}

/// One `manage_children` request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildrenEdit {
    /// Current indices of children to move.
    pub move_from: Vec<usize>,
    /// Destination indices, parallel to `move_from`.
    pub move_to: Vec<usize>,
    /// Tags to add.
    pub add_tags: Vec<Tag>,
    /// Destination indices, parallel to `add_tags`.
    pub add_at: Vec<usize>,
    /// Current indices of children to remove permanently.
    pub remove_at: Vec<usize>,
}

impl ChildrenEdit {
    /// Creates an empty edit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a move request.
    #[must_use]
    pub fn moving(mut self, from: usize, to: usize) -> Self {
        self.move_from.push(from);
        self.move_to.push(to);
        self
    }

    /// Adds an insertion request.
    #[must_use]
    pub fn adding(mut self, tag: Tag, at: usize) -> Self {
        self.add_tags.push(tag);
        self.add_at.push(at);
        self
    }

    /// Adds a removal request.
    #[must_use]
    pub fn removing(mut self, at: usize) -> Self {
        self.remove_at.push(at);
        self
    }

    /// Returns whether the edit requests nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.move_from.is_empty() && self.add_tags.is_empty() && self.remove_at.is_empty()
    }

    /// Checks that the parallel lists line up.
    pub fn validate(&self) -> Result<(), UiError> {
        if self.move_from.len() != self.move_to.len() {
            return Err(UiError::MismatchedLengths {
                what: "move_from/move_to",
                left: self.move_from.len(),
                right: self.move_to.len(),
            });
        }
        if self.add_tags.len() != self.add_at.len() {
            return Err(UiError::MismatchedLengths {
                what: "add_tags/add_at",
                left: self.add_tags.len(),
                right: self.add_at.len(),
            });
        }
        Ok(())
    }
}

/// What a successful [`apply`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Tags detached and purged.
    pub removed: Vec<Tag>,
    /// Tags detached and reinserted.
    pub moved: Vec<Tag>,
    /// Tags inserted, in ascending destination order.
    pub inserted: Vec<Tag>,
    /// Added tags that did not resolve and were skipped.
    pub skipped: Vec<Tag>,
}

/// Applies `edit` to the children of `container`.
///
/// Returns an error without touching the tree if the edit's lists are
/// mismatched, `container` is unknown, or an attachment fails
/// [`check_attach`]. [`UiError::CorruptChildren`] means `remove_at` or
/// `move_from` named an index past the end of the current child list, so the
/// caller's view of the tree is corrupt.
pub fn apply<T: ChildTree + ?Sized>(
    tree: &mut T,
    container: Tag,
    edit: &ChildrenEdit,
) -> Result<Reconciled, UiError> {
    edit.validate()?;

    let (removed, moved) = {
        let children = tree
            .children_of(container)
            .ok_or(UiError::UnknownTag(container))?;
        (
            resolve(children, &edit.remove_at, container, "remove")?,
            resolve(children, &edit.move_from, container, "move")?,
        )
    };

    let mut attaching = HashSet::with_capacity(moved.len() + edit.add_tags.len());
    for &tag in &moved {
        if !attaching.insert(tag) {
            return Err(UiError::DuplicateChild {
                container,
                child: tag,
            });
        }
    }
    for &tag in &edit.add_tags {
        // Unknown and soon-purged tags are skipped at insertion.
        if !tree.contains(tag) || is_purged_by(tree, tag, &removed) {
            continue;
        }
        if !attaching.insert(tag) {
            return Err(UiError::DuplicateChild {
                container,
                child: tag,
            });
        }
        check_attach(tree, container, tag)?;
    }

    for &tag in moved.iter().chain(&removed) {
        tree.detach(tag);
    }
    for &tag in &removed {
        tree.purge(tag);
    }

    let mut plan = BTreeMap::new();
    let mut skipped = Vec::new();
    let moves = moved.iter().copied().zip(edit.move_to.iter().copied());
    let adds = edit.add_tags.iter().copied().zip(edit.add_at.iter().copied());
    for (tag, index) in moves.chain(adds) {
        if !tree.contains(tag) {
            warn!(%container, %tag, "add of unknown tag skipped");
            skipped.push(tag);
            continue;
        }
        if let Some(previous) = plan.insert(index, tag) {
            warn!(%container, index, %previous, %tag, "two children target the same index");
        }
    }

    let mut inserted = Vec::with_capacity(plan.len());
    for (index, tag) in plan {
        tree.insert_child(container, tag, index);
        inserted.push(tag);
    }

    Ok(Reconciled {
        removed,
        moved,
        inserted,
        skipped,
    })
}

/// Appends `children`, in order, to `container`.
///
/// Unknown tags are skipped. Every known tag is checked before the first one
/// is inserted, so a rejected call leaves the tree unchanged. Returns the
/// appended tags.
pub fn append<T: ChildTree + ?Sized>(
    tree: &mut T,
    container: Tag,
    children: &[Tag],
) -> Result<Vec<Tag>, UiError> {
    let mut index = tree
        .children_of(container)
        .ok_or(UiError::UnknownTag(container))?
        .len();

    let mut appended = Vec::with_capacity(children.len());
    let mut seen = HashSet::with_capacity(children.len());
    for &child in children {
        if !tree.contains(child) {
            warn!(%container, %child, "unknown child skipped");
            continue;
        }
        if !seen.insert(child) {
            return Err(UiError::DuplicateChild { container, child });
        }
        check_attach(tree, container, child)?;
        appended.push(child);
    }

    for &child in &appended {
        tree.insert_child(container, child, index);
        index += 1;
    }
    Ok(appended)
}

/// Checks that the detached-or-attached `child` may be attached under
/// `container`.
///
/// Fails with [`UiError::WouldCycle`] if `child` is `container` or one of its
/// ancestors, and with [`UiError::AlreadyAttached`] if `child` has a parent.
pub fn check_attach<T: ChildTree + ?Sized>(
    tree: &T,
    container: Tag,
    child: Tag,
) -> Result<(), UiError> {
    let mut cursor = Some(container);
    while let Some(tag) = cursor {
        if tag == child {
            return Err(UiError::WouldCycle { container, child });
        }
        cursor = tree.parent_of(tag);
    }
    match tree.parent_of(child) {
        Some(parent) => Err(UiError::AlreadyAttached { child, parent }),
        None => Ok(()),
    }
}

/// Returns whether `tag` lies in one of the `removed` subtrees.
fn is_purged_by<T: ChildTree + ?Sized>(tree: &T, tag: Tag, removed: &[Tag]) -> bool {
    let mut cursor = Some(tag);
    while let Some(current) = cursor {
        if removed.contains(&current) {
            return true;
        }
        cursor = tree.parent_of(current);
    }
    false
}

/// Resolves `indices` against the pre-mutation child list.
fn resolve(
    children: &[Tag],
    indices: &[usize],
    container: Tag,
    what: &'static str,
) -> Result<Vec<Tag>, UiError> {
    let resolved: Vec<Tag> = indices
        .iter()
        .filter_map(|&index| children.get(index).copied())
        .collect();
    if resolved.len() != indices.len() {
        return Err(UiError::CorruptChildren {
            container,
            what,
            resolved: resolved.len(),
            requested: indices.len(),
        });
    }
    Ok(resolved)
}
