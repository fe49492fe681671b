// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::AuditSinkError;
use crate::record::DecisionRecord;
use crate::sink::DecisionSink;

/// Emits each record as a structured `tracing` event on the `audit` target.
#[derive(Debug, Default)]
pub struct TracingDecisionSink;

impl TracingDecisionSink {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl DecisionSink for TracingDecisionSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, record: Arc<DecisionRecord>) -> Result<(), AuditSinkError> {
		info!(
			target: "audit",
			decision_id = %record.id,
			decision = %record.decision,
			principal_id = %record.principal_id,
			principal_kind = %record.principal_kind,
			action = %record.action,
			resource_kind = %record.resource_kind,
			resource_id = %record.resource_id,
			matched_policy = record.matched_policy.as_deref().unwrap_or(""),
			policies_evaluated = record.policies_evaluated,
			org_id = record.org_id.as_deref().unwrap_or(""),
			agent_id = record.agent_id.as_deref().unwrap_or(""),
			"authorization decision"
		);
		Ok(())
	}
}
