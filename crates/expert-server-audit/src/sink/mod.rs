// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision sinks.

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::error::AuditSinkError;
use crate::record::DecisionRecord;

#[cfg(feature = "sink-file")]
pub mod file;
pub mod memory;
#[cfg(feature = "sink-tracing")]
pub mod tracing;

/// A destination for decision records.
///
/// Sinks are called from the logger's background task, one record at a time
/// and in queue order. An error is logged and otherwise ignored.
#[async_trait]
pub trait DecisionSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, record: Arc<DecisionRecord>) -> Result<(), AuditSinkError>;
}
