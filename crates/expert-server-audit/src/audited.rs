// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use expert_server_authz::{
	AuthorizationDecision, AuthorizationRequest, AuthzResult, Explanation, Policy,
	SharedPolicyEngine,
};

use crate::logger::DecisionLogger;
use crate::record::{DecisionLogContext, DecisionRecord};

/// Policy engine whose every decision is also handed to a [`DecisionLogger`].
///
/// The decision is computed first and returned unchanged whether or not the
/// record could be queued.
#[derive(Clone, Debug)]
pub struct AuditedPolicyEngine {
	engine: SharedPolicyEngine,
	logger: Arc<DecisionLogger>,
}

impl AuditedPolicyEngine {
	pub fn new(engine: SharedPolicyEngine, logger: Arc<DecisionLogger>) -> Self {
		Self { engine, logger }
	}

	pub fn engine(&self) -> &SharedPolicyEngine {
		&self.engine
	}

	pub fn logger(&self) -> &Arc<DecisionLogger> {
		&self.logger
	}

	pub fn is_authorized(
		&self,
		request: &AuthorizationRequest,
		context: &DecisionLogContext,
	) -> AuthorizationDecision {
		let decision = self.engine.is_authorized(request);
		self
			.logger
			.log(DecisionRecord::from_evaluation(request, &decision, context));
		decision
	}

	/// Evaluates every policy for diagnostics. Explanations are not audited.
	pub fn explain(&self, request: &AuthorizationRequest) -> Explanation {
		self.engine.explain(request)
	}

	pub fn add_policy(&self, policy: Policy) -> AuthzResult<()> {
		self.engine.add_policy(policy)
	}
}
