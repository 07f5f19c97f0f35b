// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for the [`UiManager`](crate::UiManager).

use crate::tag::RootTagRule;

/// Which dimensions of a root may grow to fit its content.
///
/// Only meaningful on root nodes; layout engines read it from
/// [`ShadowNode::size_flexibility`](crate::shadow::ShadowNode::size_flexibility).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RootSizeFlexibility {
    /// The root keeps the frame it was given.
    #[default]
    None,
    /// The root's width follows its content.
    Width,
    /// The root's height follows its content.
    Height,
    /// Both dimensions follow the content.
    WidthAndHeight,
}

impl RootSizeFlexibility {
    /// Returns whether the width is content-driven.
    #[must_use]
    pub const fn width(self) -> bool {
        matches!(self, Self::Width | Self::WidthAndHeight)
    }

    /// Returns whether the height is content-driven.
    #[must_use]
    pub const fn height(self) -> bool {
        matches!(self, Self::Height | Self::WidthAndHeight)
    }
}

/// Configuration for the [`UiManager`](crate::UiManager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiManagerConfig {
    /// Rule deciding which tags may be registered as roots.
    pub root_tag_rule: RootTagRule,
    /// Size flexibility given to newly registered roots.
    pub default_size_flexibility: RootSizeFlexibility,
    /// Props whose value flows from a node to descendants that do not set it
    /// themselves, resolved by the style-propagation pass.
    pub inherited_props: Vec<String>,
}

impl UiManagerConfig {
    /// Configuration accepting any tag as a root, for embedders that do not
    /// partition their tag space.
    #[must_use]
    pub fn any_root() -> Self {
        Self {
            root_tag_rule: RootTagRule::ANY,
            ..Self::default()
        }
    }
}

impl Default for UiManagerConfig {
    fn default() -> Self {
        Self {
            root_tag_rule: RootTagRule::ENGINE,
            default_size_flexibility: RootSizeFlexibility::None,
            inherited_props: vec!["backgroundColor".to_owned()],
        }
    }
}
