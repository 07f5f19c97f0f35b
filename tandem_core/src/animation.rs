// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout animations.
//!
//! The producer stages a [`LayoutAnimationConfig`] (plus an optional
//! completion callback) for the *next* batch with
//! [`UiManager::configure_next_layout_animation`](crate::UiManager::configure_next_layout_animation).
//! The batch pipeline ships it to the main context in a
//! [`UiBlock::PromoteAnimation`](crate::UiBlock::PromoteAnimation) ahead of
//! every layout block of the same flush, and clears it again with
//! [`UiBlock::ClearAnimation`](crate::UiBlock::ClearAnimation) after them.
//!
//! On the main context the [`LayoutAnimationController`] holds the
//! *current* configuration, hands out animation ids, and counts per-node
//! completions against a completion barrier so the callback fires exactly
//! once, after every node of its layout block finished.
//!
//! Actual interpolation is delegated to an [`AnimationExecutor`]. The
//! [`ImmediateExecutor`] jumps straight to the end state.

use core::fmt;
use core::time::Duration;

use hashbrown::HashMap;
use kurbo::Rect;
use tracing::debug;

use crate::component::{Amendment, HostView};
use crate::tag::Tag;

/// Easing curve of an animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationKind {
    /// Constant velocity.
    Linear,
    /// Accelerating from rest.
    EaseIn,
    /// Decelerating to rest.
    EaseOut,
    /// Accelerating, then decelerating.
    EaseInEaseOut,
    /// Damped spring.
    Spring {
        /// Damping ratio (`0.0..=1.0`, lower is bouncier).
        damping: f64,
        /// Initial velocity, in units of the total distance per second.
        initial_velocity: f64,
    },
    /// The platform's keyboard curve.
    Keyboard,
}

/// The property a creation animation reveals the view through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedProperty {
    /// Fade in.
    Opacity,
    /// Grow horizontally.
    ScaleX,
    /// Grow vertically.
    ScaleY,
    /// Grow in both directions.
    ScaleXY,
}

impl AnimatedProperty {
    /// The value a new view is staged at before it animates in.
    #[must_use]
    pub const fn initial_value(self) -> f64 {
        0.0
    }

    /// The value a new view ends at.
    #[must_use]
    pub const fn final_value(self) -> f64 {
        1.0
    }
}

/// Parameters of one animation phase (create, update or delete).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSpec {
    /// Overrides [`LayoutAnimationConfig::duration`] when set.
    pub duration: Option<Duration>,
    /// Delay before the animation starts.
    pub delay: Duration,
    /// Easing curve.
    pub kind: AnimationKind,
    /// Property animated on creation. Ignored for updates, which animate the
    /// frame.
    pub property: AnimatedProperty,
}

impl AnimationSpec {
    /// A spec using the configuration's duration and no delay.
    #[must_use]
    pub const fn new(kind: AnimationKind, property: AnimatedProperty) -> Self {
        Self {
            duration: None,
            delay: Duration::ZERO,
            kind,
            property,
        }
    }

    /// Sets an explicit duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets a start delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A layout-animation configuration for one batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutAnimationConfig {
    /// Default duration of every phase.
    pub duration: Duration,
    /// How new views appear. `None` shows them immediately.
    pub create: Option<AnimationSpec>,
    /// How existing views move to their new frame. `None` moves them
    /// immediately.
    pub update: Option<AnimationSpec>,
    /// How removed views disappear. Carried for completeness; removal is
    /// not animated.
    pub delete: Option<AnimationSpec>,
}

impl LayoutAnimationConfig {
    /// Fade in, ease in and out, 300 ms.
    #[must_use]
    pub const fn ease_in_ease_out() -> Self {
        let spec = AnimationSpec::new(AnimationKind::EaseInEaseOut, AnimatedProperty::Opacity);
        Self {
            duration: Duration::from_millis(300),
            create: Some(spec),
            update: Some(spec),
            delete: Some(spec),
        }
    }

    /// Fade in, linear, 500 ms.
    #[must_use]
    pub const fn linear() -> Self {
        let spec = AnimationSpec::new(AnimationKind::Linear, AnimatedProperty::Opacity);
        Self {
            duration: Duration::from_millis(500),
            create: Some(spec),
            update: Some(spec),
            delete: Some(spec),
        }
    }

    /// Scale in with a spring, 700 ms.
    #[must_use]
    pub const fn spring() -> Self {
        let fade = AnimationSpec::new(AnimationKind::Linear, AnimatedProperty::Opacity);
        let spring = AnimationSpec::new(
            AnimationKind::Spring {
                damping: 0.4,
                initial_velocity: 0.0,
            },
            AnimatedProperty::ScaleXY,
        );
        Self {
            duration: Duration::from_millis(700),
            create: Some(fade),
            update: Some(spring),
            delete: Some(fade),
        }
    }

    /// Returns the duration of `spec` under this configuration.
    #[must_use]
    pub fn duration_of(&self, spec: &AnimationSpec) -> Duration {
        spec.duration.unwrap_or(self.duration)
    }
}

/// Receives `true` if every animation of the batch ran to completion.
pub type AnimationCallback = Box<dyn FnOnce(bool) + Send>;

/// A configuration together with its completion callback, as staged on the
/// shadow context and promoted on the main context.
pub struct AnimationGroup {
    /// The configuration.
    pub config: LayoutAnimationConfig,
    /// Fired once after every animation the batch started completed.
    pub callback: Option<AnimationCallback>,
}

impl fmt::Debug for AnimationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationGroup")
            .field("config", &self.config)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Identifies one started animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub u64);

/// Identifies one completion barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BarrierId(u64);

/// What an animation moves towards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationTarget {
    /// Reveal a new view by animating `property` from `from` to `to`.
    Appear {
        /// The animated property.
        property: AnimatedProperty,
        /// Start value (already applied to the view).
        from: f64,
        /// End value.
        to: f64,
    },
    /// Move an existing view from `from` to `to`.
    Frame {
        /// The frame before the batch.
        from: Rect,
        /// The committed frame.
        to: Rect,
    },
}

/// A request handed to an [`AnimationExecutor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationRequest {
    /// Id to report completion with.
    pub id: AnimationId,
    /// The animated view.
    pub tag: Tag,
    /// Resolved duration.
    pub duration: Duration,
    /// Start delay.
    pub delay: Duration,
    /// Easing curve.
    pub kind: AnimationKind,
    /// End state.
    pub target: AnimationTarget,
}

/// Result of [`AnimationExecutor::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationStatus {
    /// The animation runs asynchronously; the executor's owner reports its
    /// end through [`HostContext::finish_animation`](crate::HostContext::finish_animation).
    Running,
    /// The animation already ended; `true` if it ran to completion.
    Finished(bool),
}

/// The platform animation primitive.
pub trait AnimationExecutor {
    /// Starts animating `view` towards `request.target`.
    fn start(&mut self, view: &mut dyn HostView, request: &AnimationRequest) -> AnimationStatus;
}

/// Applies every target immediately and reports it finished.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateExecutor;

impl AnimationExecutor for ImmediateExecutor {
    fn start(&mut self, view: &mut dyn HostView, request: &AnimationRequest) -> AnimationStatus {
        match request.target {
            AnimationTarget::Appear { property, to, .. } => view.set_animated_property(property, to),
            AnimationTarget::Frame { to, .. } => view.set_frame(to),
        }
        AnimationStatus::Finished(true)
    }
}

struct Barrier {
    total: usize,
    completed: usize,
    all_finished: bool,
    callback: AnimationCallback,
}

/// A started animation whose completion has not been reported yet.
pub(crate) struct InFlight {
    pub(crate) tag: Tag,
    pub(crate) barrier: Option<BarrierId>,
    pub(crate) amendment: Option<Amendment>,
}

/// Main-context layout-animation state.
#[derive(Default)]
pub struct LayoutAnimationController {
    current: Option<LayoutAnimationConfig>,
    callback: Option<AnimationCallback>,
    barriers: HashMap<BarrierId, Barrier>,
    in_flight: HashMap<AnimationId, InFlight>,
    next_barrier: u64,
    next_animation: u64,
}

impl fmt::Debug for LayoutAnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutAnimationController")
            .field("current", &self.current)
            .field("has_callback", &self.callback.is_some())
            .field("barriers", &self.barriers.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl LayoutAnimationController {
    /// Creates a controller with no current configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `group` the current configuration.
    pub fn promote(&mut self, group: AnimationGroup) {
        self.current = Some(group.config);
        if self.callback.is_some() {
            debug!("uncaptured layout animation callback replaced");
        }
        self.callback = group.callback;
    }

    /// Drops the current configuration, and its callback if no layout block
    /// captured it.
    pub fn clear(&mut self) {
        self.current = None;
        if self.callback.take().is_some() {
            debug!("layout animation callback dropped: nothing was laid out");
        }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn current(&self) -> Option<&LayoutAnimationConfig> {
        self.current.as_ref()
    }

    /// Captures the completion callback. Only the first caller gets it.
    pub fn take_callback(&mut self) -> Option<AnimationCallback> {
        self.callback.take()
    }

    /// Returns the number of animations still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the number of completion callbacks still waiting on their
    /// batch.
    #[must_use]
    pub fn open_barriers(&self) -> usize {
        self.barriers.len()
    }

    /// Opens a barrier that fires `callback` after `total` completions.
    ///
    /// Returns `None` when there is nothing to wait for: without a callback,
    /// or with `total == 0`, in which case the callback is dropped unfired.
    pub(crate) fn open_barrier(
        &mut self,
        total: usize,
        callback: Option<AnimationCallback>,
    ) -> Option<BarrierId> {
        let callback = callback?;
        if total == 0 {
            return None;
        }
        let id = BarrierId(self.next_barrier);
        self.next_barrier += 1;
        self.barriers.insert(
            id,
            Barrier {
                total,
                completed: 0,
                all_finished: true,
                callback,
            },
        );
        Some(id)
    }

    /// Counts one completion against `barrier`, firing its callback on the
    /// last one.
    pub(crate) fn complete(&mut self, barrier: Option<BarrierId>, finished: bool) {
        let Some(id) = barrier else {
            return;
        };
        let Some(entry) = self.barriers.get_mut(&id) else {
            return;
        };
        entry.completed += 1;
        entry.all_finished &= finished;
        if entry.completed >= entry.total
            && let Some(done) = self.barriers.remove(&id)
        {
            (done.callback)(done.all_finished);
        }
    }

    pub(crate) fn next_id(&mut self) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        id
    }

    pub(crate) fn track(&mut self, id: AnimationId, flight: InFlight) {
        self.in_flight.insert(id, flight);
    }

    pub(crate) fn untrack(&mut self, id: AnimationId) -> Option<InFlight> {
        self.in_flight.remove(&id)
    }
}
