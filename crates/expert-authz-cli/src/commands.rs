// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand implementations.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use expert_server_audit::{AuditedPolicyEngine, DecisionLogContext};
use expert_server_authz::{AuthorizationDecision, AuthorizationRequest, Policy};

/// Exit code for a denied `check`.
pub const EXIT_DENIED: u8 = 2;

/// Reads and validates a request from `path`, or from stdin when `path` is `-`.
pub fn read_request(path: &Path) -> Result<AuthorizationRequest> {
	let raw = if path == Path::new("-") {
		let mut buf = String::new();
		std::io::stdin()
			.read_to_string(&mut buf)
			.context("failed to read request from stdin")?;
		buf
	} else {
		std::fs::read_to_string(path)
			.with_context(|| format!("failed to read request file {}", path.display()))?
	};

	let request: AuthorizationRequest = serde_json::from_str(&raw)
		.with_context(|| format!("invalid authorization request in {}", path.display()))?;
	request
		.validate()
		.with_context(|| format!("rejected authorization request in {}", path.display()))?;
	Ok(request)
}

/// Evaluates and records a request, returning the decision JSON.
pub fn check(
	engine: &AuditedPolicyEngine,
	request: &AuthorizationRequest,
	context: &DecisionLogContext,
) -> Result<(String, AuthorizationDecision)> {
	let decision = engine.is_authorized(request, context);
	tracing::debug!(
		allowed = decision.is_authorized,
		matched_policy = decision.matched_policy().unwrap_or(""),
		"check complete"
	);
	let json = serde_json::to_string_pretty(&decision)?;
	Ok((json, decision))
}

pub fn explain(engine: &AuditedPolicyEngine, request: &AuthorizationRequest) -> Result<String> {
	let explanation = engine.explain(request);
	for fault in explanation.faults() {
		tracing::warn!(policy_id = %fault.policy_id, "policy faulted during explain");
	}
	Ok(serde_json::to_string_pretty(&explanation)?)
}

/// One line per policy in evaluation order.
pub fn render_policies(policies: &[Policy]) -> String {
	let id_width = policies
		.iter()
		.map(|p| p.id().len())
		.max()
		.unwrap_or(0)
		.max("ID".len());

	let mut out = format!(
		"{:<id_width$}  {:<6}  {:>8}  DESCRIPTION\n",
		"ID", "EFFECT", "PRIORITY"
	);
	for policy in policies {
		out.push_str(&format!(
			"{:<id_width$}  {:<6}  {:>8}  {}\n",
			policy.id(),
			policy.effect(),
			policy.priority(),
			policy.description()
		));
	}
	out
}

pub fn exit_code(decision: &AuthorizationDecision) -> ExitCode {
	if decision.is_authorized {
		ExitCode::SUCCESS
	} else {
		ExitCode::from(EXIT_DENIED)
	}
}
