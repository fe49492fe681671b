// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy model, built-in policy set and the evaluation engine.

pub mod builtin;
mod decision;
mod engine;
mod model;
mod rule;
mod shared;

pub use decision::{AuthorizationDecision, DecisionDiagnostics, Explanation, PolicyTrace, TraceOutcome};
pub use engine::PolicyEngine;
pub use model::{
	AuthorizationRequest, Principal, PrincipalAttributes, RequestContext, Resource,
	ResourceAttributes, ANONYMOUS_PRINCIPAL_ID,
};
pub use rule::{
	ActionSelector, Condition, Effect, EvaluationEnv, OrgScope, Policy, PolicyMatch,
	PolicyPredicate, PolicyRule, PrincipalSelector,
};
pub use shared::SharedPolicyEngine;
