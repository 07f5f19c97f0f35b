// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and component identity types.

use core::fmt;

/// A caller-assigned node identifier, shared by a shadow node and its host
/// counterpart.
///
/// Tags are never allocated by this crate; the edit-command producer picks
/// them and guarantees uniqueness across both trees.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u32);

impl Tag {
    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Decides root-ness from a tag alone.
///
/// A tag is a root tag when `tag % modulus == remainder`. The default,
/// [`RootTagRule::ENGINE`], reserves tags ending in `1` for roots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootTagRule {
    /// Divisor applied to the raw tag.
    pub modulus: u32,
    /// Remainder that marks a root tag.
    pub remainder: u32,
}

impl RootTagRule {
    /// Roots are tags with `tag % 10 == 1`.
    pub const ENGINE: Self = Self {
        modulus: 10,
        remainder: 1,
    };

    /// Every tag is accepted as a root tag.
    pub const ANY: Self = Self {
        modulus: 1,
        remainder: 0,
    };

    /// Returns whether `tag` is a root tag under this rule.
    #[inline]
    #[must_use]
    pub const fn is_root(self, tag: Tag) -> bool {
        self.modulus != 0 && tag.0 % self.modulus == self.remainder
    }
}

impl Default for RootTagRule {
    fn default() -> Self {
        Self::ENGINE
    }
}

/// Interned identity of a registered component type.
///
/// Resolved once from a view name by
/// [`ComponentRegistry::resolve`](crate::component::ComponentRegistry::resolve)
/// and carried by nodes and UI blocks instead of the name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Returns the raw registry index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_rule_accepts_tags_ending_in_one() {
        let rule = RootTagRule::ENGINE;
        assert!(rule.is_root(Tag(1)));
        assert!(rule.is_root(Tag(11)));
        assert!(rule.is_root(Tag(101)));
        assert!(!rule.is_root(Tag(2)));
        assert!(!rule.is_root(Tag(10)));
    }

    #[test]
    fn zero_modulus_never_matches() {
        let rule = RootTagRule {
            modulus: 0,
            remainder: 0,
        };
        assert!(!rule.is_root(Tag(0)));
    }

    #[test]
    fn any_rule_accepts_everything() {
        assert!(RootTagRule::ANY.is_root(Tag(0)));
        assert!(RootTagRule::ANY.is_root(Tag(42)));
    }

    #[test]
    fn tag_formats() {
        assert_eq!(format!("{:?}", Tag(7)), "Tag(7)");
        assert_eq!(format!("{}", Tag(7)), "7");
    }
}
