// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Main-context state.
//!
//! The [`HostRegistry`] holds every live host view keyed by tag, mirroring
//! the shadow tree one batch behind. The [`HostContext`] owns it together
//! with the layout-animation controller, the animation executor, and the
//! responder, and is the only thing UI blocks ever mutate.

mod context;
mod registry;

pub use context::{HostContext, Responder};
pub use registry::{HostNode, HostRegistry};
