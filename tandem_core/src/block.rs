// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UI blocks and the pending queue.
//!
//! Every host-tree mutation the shadow context decides on is recorded as a
//! [`UiBlock`] and appended to the [`UiBlockQueue`]. A flush swaps the queue
//! for an empty one and hands the captured blocks, as one [`UiBatch`], to the
//! [`MainDispatcher`]. The batch owns its blocks outright; nothing in it
//! refers back to shadow state, so the shadow context can keep editing while
//! the main context is still executing the previous batch.

use core::fmt;

use kurbo::Rect;
use serde_json::Value;

use crate::animation::AnimationGroup;
use crate::component::{Amendment, Props};
use crate::error::{BlockError, MeasureError, UiError};
use crate::host::HostContext;
use crate::reconcile::ChildrenEdit;
use crate::shadow::FrameUpdate;
use crate::tag::{ComponentId, Tag};

/// Result of [`UiManager::measure`](crate::UiManager::measure).
///
/// `x`/`y` are relative to the parent view; `page_x`/`page_y` are the view's
/// origin in its root's coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Measurement {
    /// Origin x, relative to the parent.
    pub x: f64,
    /// Origin y, relative to the parent.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Origin x in root coordinates.
    pub page_x: f64,
    /// Origin y in root coordinates.
    pub page_y: f64,
}

/// Result of [`UiManager::measure_in_window`](crate::UiManager::measure_in_window).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowMeasurement {
    /// Origin x in window coordinates.
    pub x: f64,
    /// Origin y in window coordinates.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Receives a [`Measurement`] on the main context.
pub type MeasureCallback = Box<dyn FnOnce(Result<Measurement, MeasureError>) + Send>;

/// Receives a [`WindowMeasurement`] on the main context.
pub type WindowMeasureCallback = Box<dyn FnOnce(Result<WindowMeasurement, MeasureError>) + Send>;

/// A caller-supplied block.
pub type CustomBlock = Box<dyn FnOnce(&mut HostContext) -> Result<(), BlockError> + Send>;

/// One node of a [`LayoutBlock`].
pub struct PendingFrame {
    /// The committed change.
    pub update: FrameUpdate,
    /// Component follow-up to run once the frame is applied.
    pub amendment: Option<Amendment>,
}

impl fmt::Debug for PendingFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFrame")
            .field("update", &self.update)
            .field("has_amendment", &self.amendment.is_some())
            .finish()
    }
}

/// The frame changes of one root, in the pre-order they were committed in.
#[derive(Debug)]
pub struct LayoutBlock {
    /// The root that was laid out.
    pub root: Tag,
    /// Changed nodes.
    pub nodes: Vec<PendingFrame>,
}

/// One inherited-prop change produced by the style-propagation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleUpdate {
    /// The receiving view.
    pub tag: Tag,
    /// Prop name.
    pub name: String,
    /// Effective value. `Value::Null` clears it.
    pub value: Value,
}

/// A deferred unit of main-context work.
pub enum UiBlock {
    /// Create the host root view.
    RegisterRoot {
        /// Root tag.
        tag: Tag,
        /// Component of the root view.
        component: ComponentId,
        /// Initial frame.
        frame: Rect,
    },
    /// Create a detached host view and apply its initial props.
    CreateView {
        /// New tag.
        tag: Tag,
        /// Component of the view.
        component: ComponentId,
        /// Root the node was created under.
        root: Tag,
        /// Initial props.
        props: Props,
    },
    /// Apply a prop delta to an existing view.
    UpdateView {
        /// Target view.
        tag: Tag,
        /// Changed props.
        props: Props,
    },
    /// Replay a children edit on the host tree.
    ManageChildren {
        /// Container view.
        container: Tag,
        /// The edit, identical to the one applied to the shadow tree.
        edit: ChildrenEdit,
    },
    /// Append children to a container.
    SetChildren {
        /// Container view.
        container: Tag,
        /// Children, in order.
        children: Vec<Tag>,
    },
    /// Purge a root and its whole host subtree.
    PurgeRoot {
        /// Root tag.
        tag: Tag,
    },
    /// Apply one root's committed frames, animating per the current
    /// configuration.
    Layout(LayoutBlock),
    /// Apply inherited-prop changes.
    PropagateStyles(Vec<StyleUpdate>),
    /// Make a configuration current.
    PromoteAnimation(AnimationGroup),
    /// Drop the current configuration.
    ClearAnimation,
    /// Notify transaction listeners that the batch completed.
    NotifyBatchComplete,
    /// Measure a view relative to its parent and root.
    Measure {
        /// Target view.
        tag: Tag,
        /// Result receiver.
        callback: MeasureCallback,
    },
    /// Measure a view in window coordinates.
    MeasureInWindow {
        /// Target view.
        tag: Tag,
        /// Result receiver.
        callback: WindowMeasureCallback,
    },
    /// Forward an imperative command to a view's component.
    DispatchCommand {
        /// Target view.
        tag: Tag,
        /// Command identifier.
        command: u32,
        /// Command arguments.
        args: Vec<Value>,
    },
    /// Record the JS responder.
    SetResponder {
        /// Responder view.
        tag: Tag,
        /// Whether native gesture handling should be blocked.
        block_native: bool,
    },
    /// Clear the JS responder.
    ClearResponder,
    /// Arbitrary main-context work.
    Custom(CustomBlock),
}

impl UiBlock {
    /// Wraps a closure as a [`UiBlock::Custom`].
    pub fn custom<F>(f: F) -> Self
    where
        F: FnOnce(&mut HostContext) -> Result<(), BlockError> + Send + 'static,
    {
        Self::Custom(Box::new(f))
    }

    /// A short name for logs and trace events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterRoot { .. } => "register_root",
            Self::CreateView { .. } => "create_view",
            Self::UpdateView { .. } => "update_view",
            Self::ManageChildren { .. } => "manage_children",
            Self::SetChildren { .. } => "set_children",
            Self::PurgeRoot { .. } => "purge_root",
            Self::Layout(_) => "layout",
            Self::PropagateStyles(_) => "propagate_styles",
            Self::PromoteAnimation(_) => "promote_animation",
            Self::ClearAnimation => "clear_animation",
            Self::NotifyBatchComplete => "notify_batch_complete",
            Self::Measure { .. } => "measure",
            Self::MeasureInWindow { .. } => "measure_in_window",
            Self::DispatchCommand { .. } => "dispatch_command",
            Self::SetResponder { .. } => "set_responder",
            Self::ClearResponder => "clear_responder",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for UiBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterRoot { tag, frame, .. } => f
                .debug_struct("RegisterRoot")
                .field("tag", tag)
                .field("frame", frame)
                .finish_non_exhaustive(),
            Self::CreateView { tag, root, .. } => f
                .debug_struct("CreateView")
                .field("tag", tag)
                .field("root", root)
                .finish_non_exhaustive(),
            Self::UpdateView { tag, props } => f
                .debug_struct("UpdateView")
                .field("tag", tag)
                .field("props", props)
                .finish(),
            Self::ManageChildren { container, edit } => f
                .debug_struct("ManageChildren")
                .field("container", container)
                .field("edit", edit)
                .finish(),
            Self::SetChildren {
                container,
                children,
            } => f
                .debug_struct("SetChildren")
                .field("container", container)
                .field("children", children)
                .finish(),
            Self::PurgeRoot { tag } => f.debug_struct("PurgeRoot").field("tag", tag).finish(),
            Self::Layout(block) => f.debug_tuple("Layout").field(block).finish(),
            Self::PropagateStyles(updates) => {
                f.debug_tuple("PropagateStyles").field(updates).finish()
            }
            Self::PromoteAnimation(group) => {
                f.debug_tuple("PromoteAnimation").field(group).finish()
            }
            Self::DispatchCommand { tag, command, args } => f
                .debug_struct("DispatchCommand")
                .field("tag", tag)
                .field("command", command)
                .field("args", args)
                .finish(),
            Self::SetResponder { tag, block_native } => f
                .debug_struct("SetResponder")
                .field("tag", tag)
                .field("block_native", block_native)
                .finish(),
            Self::Measure { tag, .. } | Self::MeasureInWindow { tag, .. } => f
                .debug_struct(self.kind())
                .field("tag", tag)
                .finish_non_exhaustive(),
            Self::ClearAnimation
            | Self::NotifyBatchComplete
            | Self::ClearResponder
            | Self::Custom(_) => f.write_str(self.kind()),
        }
    }
}

/// One flushed unit of blocks, executed in order on the main context.
#[derive(Debug)]
pub struct UiBatch {
    seq: u64,
    blocks: Vec<UiBlock>,
}

impl UiBatch {
    /// Assembles a batch by hand.
    ///
    /// Batches normally come from [`UiManager::flush`](crate::UiManager::flush);
    /// this is for dispatchers and tests that replay blocks directly.
    #[must_use]
    pub fn new(seq: u64, blocks: Vec<UiBlock>) -> Self {
        Self { seq, blocks }
    }

    /// Monotonically increasing flush number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The blocks, in enqueue order.
    #[must_use]
    pub fn blocks(&self) -> &[UiBlock] {
        &self.blocks
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns whether the batch holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Consumes the batch.
    #[must_use]
    pub fn into_blocks(self) -> Vec<UiBlock> {
        self.blocks
    }
}

/// Hands batches to the main context.
///
/// Implementations must deliver batches in the order they receive them.
pub trait MainDispatcher: Send {
    /// Schedules `batch` for execution on the main context.
    fn dispatch(&mut self, batch: UiBatch);
}

impl<F> MainDispatcher for F
where
    F: FnMut(UiBatch) + Send,
{
    fn dispatch(&mut self, batch: UiBatch) {
        self(batch);
    }
}

/// Pending blocks of the batch being accumulated.
#[derive(Debug, Default)]
pub struct UiBlockQueue {
    pending: Vec<UiBlock>,
    next_seq: u64,
    torn_down: bool,
}

impl UiBlockQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block.
    ///
    /// Once the queue was torn down the block is dropped and
    /// [`UiError::TornDown`] returned.
    pub fn push(&mut self, block: UiBlock) -> Result<(), UiError> {
        if self.torn_down {
            return Err(UiError::TornDown);
        }
        self.pending.push(block);
        Ok(())
    }

    /// Swaps the pending blocks for an empty list and returns them as a
    /// batch, or `None` if nothing was pending.
    pub fn take_batch(&mut self) -> Option<UiBatch> {
        if self.pending.is_empty() {
            return None;
        }
        let blocks = core::mem::take(&mut self.pending);
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(UiBatch::new(seq, blocks))
    }

    /// Rejects every further block.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
    }

    /// Returns whether [`tear_down`](Self::tear_down) was called.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Returns the number of pending blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether no block is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
