// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization decisions for the Expert Agent Platform.
//!
//! Every request handler asks one question: may this principal perform this
//! action on this resource? [`PolicyEngine`] answers it from a priority-ordered
//! set of declarative policies using strict first match, bracketed by a
//! test-principal guard at the top and `default-deny` at the bottom.
//!
//! ```
//! use expert_server_authz::{
//! 	build_principal, Action, AuthSession, AuthorizationRequest, Environment, Membership,
//! 	OrgRole, PolicyEngine, Resource, SessionUser,
//! };
//!
//! let engine = PolicyEngine::new(Environment::Production);
//! let session = AuthSession {
//! 	user: Some(SessionUser {
//! 		id: Some("user-1".to_string()),
//! 		..Default::default()
//! 	}),
//! };
//! let principal = build_principal(Some(&session), &[Membership::new("org1", OrgRole::Admin)]);
//!
//! let decision = engine.is_authorized(&AuthorizationRequest::new(
//! 	principal,
//! 	Action::InviteMember,
//! 	Resource::org("org1"),
//! ));
//! assert!(decision.is_authorized);
//! assert_eq!(decision.matched_policy(), Some("org-admin-invite"));
//! ```

pub mod error;
pub mod policy;
pub mod principal;
pub mod types;

pub use error::{AuthzError, AuthzResult, PredicateError};
pub use policy::builtin;
pub use policy::{
	ActionSelector, AuthorizationDecision, AuthorizationRequest, Condition, DecisionDiagnostics,
	Effect, EvaluationEnv, Explanation, OrgScope, Policy, PolicyEngine, PolicyMatch,
	PolicyPredicate, PolicyRule, PolicyTrace, Principal, PrincipalAttributes, PrincipalSelector,
	RequestContext, Resource, ResourceAttributes, SharedPolicyEngine, TraceOutcome,
	ANONYMOUS_PRINCIPAL_ID,
};
pub use principal::{build_principal, AuthSession, Membership, SessionUser};
pub use types::{
	Action, Environment, OrgId, OrgRole, PrincipalId, PrincipalKind, ResourceId, ResourceKind,
	UnknownEnvironment,
};
