// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Development sinks for tandem pipeline events.
//!
//! This crate provides [`TraceSink`](tandem_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory recording with JSON export.

pub mod pretty;
pub mod recorder;
