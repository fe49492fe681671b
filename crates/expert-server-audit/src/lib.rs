// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit logging for the Expert Agent Platform.
//!
//! Every authorization decision can be recorded as a [`DecisionRecord`] and
//! fanned out to sinks by a [`DecisionLogger`]. Logging is asynchronous: the
//! request path only pushes onto a bounded queue and the decision never
//! depends on whether that succeeded.
//!
//! # Sinks
//!
//! - [`TracingDecisionSink`] (feature `sink-tracing`): structured `tracing` events
//! - [`FileDecisionSink`] (feature `sink-file`): JSON lines, optionally date-rotated
//! - [`MemoryDecisionSink`]: bounded in-memory buffer

pub mod audited;
pub mod error;
pub mod filter;
pub mod logger;
pub mod record;
pub mod sink;

pub use audited::AuditedPolicyEngine;
pub use error::{AuditError, AuditResult, AuditSinkError};
pub use filter::DecisionFilter;
pub use logger::DecisionLogger;
pub use record::{
	DecisionLogContext, DecisionOutcome, DecisionRecord, DecisionRecordBuilder, Direction,
};
pub use sink::memory::MemoryDecisionSink;
pub use sink::DecisionSink;

#[cfg(feature = "sink-file")]
pub use sink::file::FileDecisionSink;
#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingDecisionSink;
