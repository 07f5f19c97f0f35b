// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-context runtime for tandem.
//!
//! The [`UiManager`](tandem_core::UiManager) lives on a dedicated shadow
//! thread ([`ShadowThread`]) and is reached through cloneable
//! [`ShadowHandle`]s. Flushed batches travel back over a channel
//! ([`main_queue::channel`]) and the main loop runs them on its
//! [`HostContext`](tandem_core::HostContext) with [`MainQueue::pump`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use tandem_core::{ComponentRegistry, HostContext, UiManager};
//! # use tandem_runtime::{ShadowThread, main_queue};
//! # fn run(components: Arc<ComponentRegistry>) -> Result<(), tandem_runtime::RuntimeError> {
//! let (dispatcher, mut queue) = main_queue::channel();
//! let manager = UiManager::new(Arc::clone(&components), dispatcher);
//! let shadow = ShadowThread::spawn(manager)?;
//! let mut host = HostContext::new(components);
//!
//! shadow.handle().run(|ui| {
//!     let _ = ui.set_needs_layout();
//! })?;
//! queue.pump_blocking(&mut host)?;
//! shadow.shutdown()
//! # }
//! ```

mod error;
pub mod main_queue;
mod shadow_thread;

pub use error::RuntimeError;
pub use main_queue::{ChannelDispatcher, MainQueue};
pub use shadow_thread::{ShadowHandle, ShadowThread};
