// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision and explanation types returned by the engine.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::model::Principal;
use super::rule::{Effect, Policy};

/// How the decision was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionDiagnostics {
	/// Number of policies evaluated up to and including the one that matched.
	pub policies_evaluated: usize,
	/// Id of the policy that decided the request.
	pub matched_policy: Option<String>,
}

/// The outcome of an authorization check.
///
/// `is_authorized` is true if and only if the matched policy permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
	pub is_authorized: bool,
	pub reason: Option<String>,
	pub diagnostics: DecisionDiagnostics,
}

impl AuthorizationDecision {
	pub(crate) fn from_match(policy: &Policy, position: usize, reason: Option<String>) -> Self {
		Self {
			is_authorized: policy.effect().is_permit(),
			reason,
			diagnostics: DecisionDiagnostics {
				policies_evaluated: position,
				matched_policy: Some(policy.id().to_string()),
			},
		}
	}

	pub(crate) fn unmatched(policies_evaluated: usize) -> Self {
		Self {
			is_authorized: false,
			reason: Some("No policy matched the request".to_string()),
			diagnostics: DecisionDiagnostics {
				policies_evaluated,
				matched_policy: None,
			},
		}
	}

	pub fn is_denied(&self) -> bool {
		!self.is_authorized
	}

	pub fn matched_policy(&self) -> Option<&str> {
		self.diagnostics.matched_policy.as_deref()
	}

	/// Maps the decision onto the HTTP status an adapter should return.
	///
	/// A denial for an anonymous principal is `401 Unauthorized` (signing in
	/// might help); for any other principal it is `403 Forbidden`.
	pub fn http_status(&self, principal: &Principal) -> StatusCode {
		if self.is_authorized {
			StatusCode::OK
		} else if principal.is_anonymous() {
			StatusCode::UNAUTHORIZED
		} else {
			StatusCode::FORBIDDEN
		}
	}
}

/// What happened when a single policy was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraceOutcome {
	Matched { reason: Option<String> },
	NotMatched,
	/// The policy's predicate failed or panicked; counted as not matched.
	Faulted { error: String },
}

/// Evaluation record for one policy in explain mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTrace {
	pub policy_id: String,
	pub effect: Effect,
	pub priority: i32,
	#[serde(flatten)]
	pub outcome: TraceOutcome,
}

impl PolicyTrace {
	pub fn is_match(&self) -> bool {
		matches!(self.outcome, TraceOutcome::Matched { .. })
	}
}

/// Full evaluation of every policy, plus the first-match decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
	pub decision: AuthorizationDecision,
	pub traces: Vec<PolicyTrace>,
}

impl Explanation {
	/// Policies that also matched but were shadowed by the deciding policy.
	pub fn shadowed(&self) -> impl Iterator<Item = &PolicyTrace> {
		let decided_by = self.decision.matched_policy();
		self
			.traces
			.iter()
			.filter(move |trace| trace.is_match() && Some(trace.policy_id.as_str()) != decided_by)
	}

	/// Policies whose predicates faulted.
	pub fn faults(&self) -> impl Iterator<Item = &PolicyTrace> {
		self
			.traces
			.iter()
			.filter(|trace| matches!(trace.outcome, TraceOutcome::Faulted { .. }))
	}
}
