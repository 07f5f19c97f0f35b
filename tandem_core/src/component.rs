// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component capability and registry.
//!
//! A [`Component`] is the per-type behavior table the pipeline consults: it
//! builds host views, may contribute amendment and propagation blocks, and
//! handles imperative commands. Components are registered once by name in a
//! [`ComponentRegistry`]; every node afterwards carries the interned
//! [`ComponentId`] instead of the name.
//!
//! The registry is immutable once shared, so the shadow and main contexts
//! hold the same `Arc<ComponentRegistry>`.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Rect;
use serde_json::Value;

use crate::animation::AnimatedProperty;
use crate::block::UiBlock;
use crate::error::CommandError;
use crate::shadow::ShadowNode;
use crate::tag::{ComponentId, Tag};

/// A property bag, as delivered by the edit-command producer.
pub type Props = serde_json::Map<String, Value>;

/// A component-specific follow-up applied to a host view after its new frame
/// was committed.
pub type Amendment = Box<dyn FnOnce(&mut dyn HostView) + Send>;

/// Merges `update` into `target`.
///
/// A `null` value removes the key, restoring the component default.
pub fn merge_props(target: &mut Props, update: &Props) {
    for (key, value) in update {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// A live view on the main context.
///
/// Only [`set_props`](Self::set_props) is required; everything else defaults
/// to a no-op.
pub trait HostView {
    /// Applies a property bag.
    fn set_props(&mut self, props: &Props);

    /// Applies a new frame, relative to the parent view.
    fn set_frame(&mut self, frame: Rect) {
        _ = frame;
    }

    /// Sets a single animatable property (used to stage and finish
    /// appearance animations).
    fn set_animated_property(&mut self, property: AnimatedProperty, value: f64) {
        _ = (property, value);
    }

    /// Applies a value resolved by the style-propagation pass. `Value::Null`
    /// clears a previously inherited value.
    fn set_inherited_prop(&mut self, name: &str, value: &Value) {
        _ = (name, value);
    }

    /// Whether this view wants [`batch_did_complete`](Self::batch_did_complete)
    /// after every batch. Read once, when the view is created.
    fn wants_batch_notifications(&self) -> bool {
        false
    }

    /// Called once per executed batch for views that opted in.
    fn batch_did_complete(&mut self) {}

    /// Releases platform resources. Called right before the view is dropped
    /// from the host registry.
    fn invalidate(&mut self) {}
}

/// The behavior table of one component type.
pub trait Component: Send + Sync {
    /// The view name this component is registered under.
    fn name(&self) -> &str;

    /// Builds the host view for a new node.
    fn create_view(&self, tag: Tag) -> Box<dyn HostView>;

    /// Returns a follow-up to run on the host view once the node's new frame
    /// has been applied (or, when animated, once the animation completes).
    fn amendment(&self, node: &ShadowNode) -> Option<Amendment> {
        _ = node;
        None
    }

    /// Returns and clears any component-wide property-propagation work
    /// accumulated since the previous batch.
    fn take_pending_block(&self) -> Option<UiBlock> {
        None
    }

    /// Handles an imperative command addressed to one of this component's
    /// views.
    fn dispatch_command(
        &self,
        view: &mut dyn HostView,
        command: u32,
        args: &[Value],
    ) -> Result<(), CommandError> {
        _ = (view, args);
        Err(CommandError::Unsupported {
            component: self.name().to_owned(),
            command,
        })
    }
}

/// Name → component table, built before the pipeline starts.
#[derive(Default)]
pub struct ComponentRegistry {
    components: Vec<Arc<dyn Component>>,
    by_name: HashMap<String, ComponentId>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("names", &self.by_name.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component` under its name and returns its id.
    ///
    /// Registering a second component under an existing name replaces the
    /// first and keeps its id.
    pub fn register<C: Component + 'static>(&mut self, component: C) -> ComponentId {
        let name = component.name().to_owned();
        if let Some(&id) = self.by_name.get(&name) {
            self.components[id.0 as usize] = Arc::new(component);
            return id;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "component tables stay far below u32::MAX entries"
        )]
        let id = ComponentId(self.components.len() as u32);
        self.components.push(Arc::new(component));
        self.by_name.insert(name, id);
        id
    }

    /// Resolves a view name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Returns the component for an id produced by this registry.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components.get(id.0 as usize).map(|c| &**c)
    }

    /// Iterates over every registered component, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "ids were assigned from the same indices"
                )]
                (ComponentId(i as u32), &**c)
            })
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns whether no component is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
