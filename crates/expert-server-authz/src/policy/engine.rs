// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation engine.
//!
//! [`PolicyEngine`] holds a priority-ordered policy list and answers "is this
//! request authorized?" by strict first match:
//!
//! 1. Walk policies from highest to lowest priority
//! 2. The first policy whose rule matches decides: permit or forbid
//! 3. `default-deny` sits at the bottom and matches everything
//!
//! Lower-priority matches are never consulted, so a forbid only wins over a
//! permit if it is registered above it. [`PolicyEngine::explain`] shows every
//! policy that matched, including the shadowed ones.
//!
//! Evaluation is pure and synchronous. A custom predicate that fails or panics
//! is logged and treated as "does not match"; it can never produce a permit on
//! its own account.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info, instrument, warn};

use super::builtin::{self, DEFAULT_DENY_PRIORITY, SECURITY_GUARD_PRIORITY};
use super::decision::{AuthorizationDecision, Explanation, PolicyTrace, TraceOutcome};
use super::model::AuthorizationRequest;
use super::rule::{EvaluationEnv, Policy};
use crate::error::{AuthzError, AuthzResult, PredicateError};
use crate::types::Environment;

/// Outcome of evaluating one policy, with faults contained.
enum Outcome {
	Matched(Option<String>),
	NotMatched,
	Faulted(PredicateError),
}

/// The authorization engine.
///
/// Construct one per process at the composition root and pass it by
/// reference (or wrap it in [`SharedPolicyEngine`](crate::SharedPolicyEngine)
/// when policies are registered after startup).
#[derive(Debug, Clone)]
pub struct PolicyEngine {
	env: EvaluationEnv,
	policies: Vec<Policy>,
}

impl PolicyEngine {
	/// Creates an engine with the built-in policy set.
	pub fn new(environment: Environment) -> Self {
		let mut engine = Self {
			env: EvaluationEnv { environment },
			policies: builtin::policies(),
		};
		engine.sort();
		engine
	}

	/// Creates an engine with the built-in set plus `policies`, rejecting the
	/// whole set if any one of them is invalid.
	pub fn with_policies(
		environment: Environment,
		policies: impl IntoIterator<Item = Policy>,
	) -> AuthzResult<Self> {
		let mut engine = Self::new(environment);
		for policy in policies {
			engine.add_policy(policy)?;
		}
		Ok(engine)
	}

	pub fn environment(&self) -> Environment {
		self.env.environment
	}

	/// Policies in evaluation order.
	pub fn policies(&self) -> &[Policy] {
		&self.policies
	}

	pub fn policy(&self, id: &str) -> Option<&Policy> {
		self.policies.iter().find(|policy| policy.id() == id)
	}

	/// Checks that `policy` could be registered.
	pub fn validate_policy(&self, policy: &Policy) -> AuthzResult<()> {
		if policy.id().trim().is_empty() {
			return Err(AuthzError::InvalidPolicyId);
		}
		if self.policy(policy.id()).is_some() {
			return Err(AuthzError::DuplicatePolicyId(policy.id().to_string()));
		}
		if policy.priority() <= DEFAULT_DENY_PRIORITY || policy.priority() >= SECURITY_GUARD_PRIORITY {
			return Err(AuthzError::ReservedPriority {
				id: policy.id().to_string(),
				priority: policy.priority(),
				min: DEFAULT_DENY_PRIORITY,
				max: SECURITY_GUARD_PRIORITY,
			});
		}
		Ok(())
	}

	/// Registers a policy and restores priority order.
	///
	/// Ties keep registration order, so a new policy lands after existing
	/// policies of equal priority. There is no removal: retire a policy by
	/// registering it with a condition that never matches.
	pub fn add_policy(&mut self, policy: Policy) -> AuthzResult<()> {
		self.validate_policy(&policy)?;
		info!(
			policy_id = policy.id(),
			effect = %policy.effect(),
			priority = policy.priority(),
			"registered policy"
		);
		self.policies.push(policy);
		self.sort();
		Ok(())
	}

	/// Returns a new engine with `policy` registered, leaving `self` untouched.
	pub fn with_policy(&self, policy: Policy) -> AuthzResult<Self> {
		let mut next = self.clone();
		next.add_policy(policy)?;
		Ok(next)
	}

	fn sort(&mut self) {
		// `sort_by` is stable.
		self
			.policies
			.sort_by(|a, b| b.priority().cmp(&a.priority()));
	}

	/// Decides a request by first match.
	///
	/// Never fails: unknown actions and resource kinds fall through to
	/// `default-deny`.
	#[instrument(
		level = "debug",
		skip(self, request),
		fields(
			principal_id = %request.principal.id,
			principal_kind = %request.principal.kind,
			action = %request.action,
			resource_kind = %request.resource.kind,
			resource_id = %request.resource.id,
		)
	)]
	pub fn is_authorized(&self, request: &AuthorizationRequest) -> AuthorizationDecision {
		for (index, policy) in self.policies.iter().enumerate() {
			if let Outcome::Matched(reason) = self.evaluate_policy(policy, request) {
				let decision = AuthorizationDecision::from_match(policy, index + 1, reason);
				debug!(
					matched_policy = policy.id(),
					is_authorized = decision.is_authorized,
					policies_evaluated = index + 1,
					"authorization decision"
				);
				return decision;
			}
		}

		warn!("no policy matched; denying");
		AuthorizationDecision::unmatched(self.policies.len())
	}

	/// Evaluates every policy and reports each outcome alongside the
	/// first-match decision, which is identical to [`Self::is_authorized`].
	#[instrument(level = "debug", skip(self, request), fields(action = %request.action))]
	pub fn explain(&self, request: &AuthorizationRequest) -> Explanation {
		let mut decision = None;
		let mut traces = Vec::with_capacity(self.policies.len());

		for (index, policy) in self.policies.iter().enumerate() {
			let outcome = match self.evaluate_policy(policy, request) {
				Outcome::Matched(reason) => {
					if decision.is_none() {
						decision = Some(AuthorizationDecision::from_match(
							policy,
							index + 1,
							reason.clone(),
						));
					}
					TraceOutcome::Matched { reason }
				}
				Outcome::NotMatched => TraceOutcome::NotMatched,
				Outcome::Faulted(error) => TraceOutcome::Faulted {
					error: error.to_string(),
				},
			};
			traces.push(PolicyTrace {
				policy_id: policy.id().to_string(),
				effect: policy.effect(),
				priority: policy.priority(),
				outcome,
			});
		}

		Explanation {
			decision: decision.unwrap_or_else(|| AuthorizationDecision::unmatched(self.policies.len())),
			traces,
		}
	}

	fn evaluate_policy(&self, policy: &Policy, request: &AuthorizationRequest) -> Outcome {
		let result = panic::catch_unwind(AssertUnwindSafe(|| policy.evaluate(request, &self.env)));

		match result {
			Ok(Ok(matched)) if matched.matches => Outcome::Matched(matched.reason),
			Ok(Ok(_)) => Outcome::NotMatched,
			Ok(Err(error)) => {
				warn!(
					policy_id = policy.id(),
					error = %error,
					"policy predicate failed; treating as no match"
				);
				Outcome::Faulted(error)
			}
			Err(payload) => {
				let message = panic_message(payload.as_ref());
				warn!(
					policy_id = policy.id(),
					panic = %message,
					"policy predicate panicked; treating as no match"
				);
				Outcome::Faulted(PredicateError::Panicked(message))
			}
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::builtin::ids;
	use crate::policy::model::{Principal, Resource};
	use crate::policy::rule::{Condition, PolicyPredicate, PrincipalSelector};
	use crate::types::{Action, OrgRole, ResourceKind};

	fn engine() -> PolicyEngine {
		PolicyEngine::new(Environment::Development)
	}

	fn prod_engine() -> PolicyEngine {
		PolicyEngine::new(Environment::Production)
	}

	fn check(
		engine: &PolicyEngine,
		principal: Principal,
		action: Action,
		resource: Resource,
	) -> AuthorizationDecision {
		engine.is_authorized(&AuthorizationRequest::new(principal, action, resource))
	}

	#[derive(Debug)]
	struct Failing;

	impl PolicyPredicate for Failing {
		fn evaluate(&self, _request: &AuthorizationRequest) -> Result<bool, PredicateError> {
			Err(PredicateError::Failed("lookup table unavailable".to_string()))
		}
	}

	#[derive(Debug)]
	struct Panicking;

	impl PolicyPredicate for Panicking {
		fn evaluate(&self, _request: &AuthorizationRequest) -> Result<bool, PredicateError> {
			panic!("predicate bug")
		}
	}

	mod ownership {
		use super::*;

		#[test]
		fn user_reads_own_profile() {
			let decision = check(
				&engine(),
				Principal::user("user-1"),
				Action::GetProfile,
				Resource::user("user-1"),
			);
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::USER_OWN_PROFILE));
			assert_eq!(
				decision.reason.as_deref(),
				Some("Users can access their own profile")
			);
		}

		#[test]
		fn user_cannot_read_other_profile() {
			let decision = check(
				&engine(),
				Principal::user("user-1"),
				Action::GetProfile,
				Resource::user("user-2"),
			);
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}
	}

	mod role_hierarchy {
		use super::*;

		fn owner() -> Principal {
			Principal::user("user-1").with_membership("org1", OrgRole::Owner)
		}

		fn admin() -> Principal {
			Principal::user("user-1").with_membership("org1", OrgRole::Admin)
		}

		#[test]
		fn owner_invites_via_admin_invite_policy() {
			let decision = check(&engine(), owner(), Action::InviteMember, Resource::org("org1"));
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::ORG_ADMIN_INVITE));
		}

		#[test]
		fn owner_deletes_org() {
			let decision = check(&engine(), owner(), Action::DeleteOrg, Resource::org("org1"));
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::ORG_OWNER_MANAGE));
		}

		#[test]
		fn role_outside_org_ids_is_denied() {
			let mut principal = Principal::user("user-1");
			principal.attributes.roles.insert("org1".into(), OrgRole::Owner);

			let decision = check(&engine(), principal, Action::DeleteOrg, Resource::org("org1"));
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}

		#[test]
		fn admin_cannot_delete_org() {
			let decision = check(&engine(), admin(), Action::DeleteOrg, Resource::org("org1"));
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}

		#[test]
		fn admin_configures_sso() {
			let decision = check(&engine(), admin(), Action::ConfigureSso, Resource::org("org1"));
			assert!(decision.is_authorized);
		}

		#[test]
		fn owner_cannot_invite_cross_tenant() {
			let decision = check(&engine(), owner(), Action::InviteMember, Resource::org("org2"));
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}

		#[test]
		fn member_views_but_does_not_manage() {
			let member = Principal::user("user-1").with_membership("org1", OrgRole::Member);
			assert!(check(&engine(), member.clone(), Action::GetOrg, Resource::org("org1")).is_authorized);
			assert!(!check(&engine(), member, Action::UpdateOrg, Resource::org("org1")).is_authorized);
		}
	}

	mod anonymous {
		use super::*;

		#[test]
		fn lists_public_agents() {
			let decision = check(
				&engine(),
				Principal::anonymous(),
				Action::ListAgents,
				Resource::wildcard(ResourceKind::Agent).with_public(true),
			);
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::ANONYMOUS_PUBLIC_ONLY));
		}

		#[test]
		fn cannot_query_agents() {
			for resource in [
				Resource::agent("agent-1"),
				Resource::agent("agent-1").with_public(true),
				Resource::wildcard(ResourceKind::Agent).with_public(true),
			] {
				let decision = check(&engine(), Principal::anonymous(), Action::QueryAgent, resource);
				assert!(!decision.is_authorized);
			}
		}

		#[test]
		fn cannot_create_orgs_or_sessions() {
			assert!(!check(
				&engine(),
				Principal::anonymous(),
				Action::CreateOrg,
				Resource::wildcard(ResourceKind::Org)
			)
			.is_authorized);
			assert!(!check(
				&engine(),
				Principal::anonymous(),
				Action::CreateSession,
				Resource::wildcard(ResourceKind::Session)
			)
			.is_authorized);
		}
	}

	mod security_guard {
		use super::*;

		fn tester() -> Principal {
			Principal::user("user-1")
				.with_membership("org1", OrgRole::Owner)
				.with_test_principal(true)
		}

		#[test]
		fn blocks_test_principal_in_production() {
			let decision = check(&prod_engine(), tester(), Action::DeleteOrg, Resource::org("org1"));
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::SECURITY_GUARD));
			assert_eq!(decision.diagnostics.policies_evaluated, 1);
		}

		#[test]
		fn allows_test_principal_elsewhere() {
			let decision = check(&engine(), tester(), Action::DeleteOrg, Resource::org("org1"));
			assert!(decision.is_authorized);
		}

		#[test]
		fn registered_permit_cannot_outrank_guard() {
			let mut engine = prod_engine();
			let result = engine.add_policy(
				Policy::permit("backdoor", SECURITY_GUARD_PRIORITY).when(Condition::Always),
			);
			assert!(matches!(result, Err(AuthzError::ReservedPriority { .. })));

			engine
				.add_policy(Policy::permit("almost-top", SECURITY_GUARD_PRIORITY - 1))
				.unwrap();
			let decision = check(&engine, tester(), Action::GetOrg, Resource::org("org1"));
			assert_eq!(decision.matched_policy(), Some(ids::SECURITY_GUARD));
		}
	}

	mod fail_closed {
		use super::*;

		#[test]
		fn unknown_action_is_denied_by_default() {
			let engine = engine();
			let decision = check(
				&engine,
				Principal::user("user-1").with_membership("org1", OrgRole::Owner),
				Action::parse("TransferOwnership"),
				Resource::org("org1"),
			);
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
			assert_eq!(decision.diagnostics.policies_evaluated, engine.policies().len());
		}

		#[test]
		fn unknown_resource_kind_is_denied() {
			let decision = check(
				&engine(),
				Principal::user("user-1"),
				Action::GetFile,
				Resource::new(ResourceKind::parse("Bucket"), "b1").with_owner("user-1"),
			);
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}

		#[test]
		fn services_get_nothing_from_builtin_policies() {
			let decision = check(
				&engine(),
				Principal::service("indexer"),
				Action::ListFiles,
				Resource::wildcard(ResourceKind::File),
			);
			assert!(!decision.is_authorized);
		}

		#[test]
		fn failing_predicate_is_not_a_permit() {
			let mut engine = engine();
			engine
				.add_policy(Policy::permit("flaky", 950).when(Condition::custom(Failing)))
				.unwrap();
			let decision = check(
				&engine,
				Principal::user("user-1"),
				Action::DeleteOrg,
				Resource::org("org1"),
			);
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
		}

		#[test]
		fn panicking_predicate_is_contained() {
			let mut engine = engine();
			engine
				.add_policy(Policy::permit("buggy", 950).when(Condition::custom(Panicking)))
				.unwrap();
			let request = AuthorizationRequest::new(
				Principal::user("user-1"),
				Action::GetProfile,
				Resource::user("user-1"),
			);

			let decision = engine.is_authorized(&request);
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::USER_OWN_PROFILE));

			let explanation = engine.explain(&request);
			let faults: Vec<_> = explanation.faults().collect();
			assert_eq!(faults.len(), 1);
			assert_eq!(faults[0].policy_id, "buggy");
			assert_eq!(
				faults[0].outcome,
				TraceOutcome::Faulted {
					error: "predicate panicked: predicate bug".to_string()
				}
			);
		}
	}

	mod first_match {
		use super::*;

		fn forbid_profiles(priority: i32) -> Policy {
			Policy::forbid(format!("freeze-profiles-{priority}"), priority)
				.describe("Profiles are frozen")
				.actions([Action::GetProfile, Action::UpdateProfile])
		}

		#[test]
		fn lower_priority_forbid_is_shadowed() {
			let mut engine = engine();
			engine.add_policy(forbid_profiles(100)).unwrap();
			let decision = check(
				&engine,
				Principal::user("user-1"),
				Action::UpdateProfile,
				Resource::user("user-1"),
			);
			assert!(decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some(ids::USER_OWN_PROFILE));
		}

		#[test]
		fn higher_priority_forbid_wins() {
			let mut engine = engine();
			engine.add_policy(forbid_profiles(850)).unwrap();
			let decision = check(
				&engine,
				Principal::user("user-1"),
				Action::UpdateProfile,
				Resource::user("user-1"),
			);
			assert!(!decision.is_authorized);
			assert_eq!(decision.matched_policy(), Some("freeze-profiles-850"));
			assert_eq!(decision.reason.as_deref(), Some("Profiles are frozen"));
		}

		#[test]
		fn explain_lists_shadowed_matches() {
			let mut engine = engine();
			engine.add_policy(forbid_profiles(100)).unwrap();
			let explanation = engine.explain(&AuthorizationRequest::new(
				Principal::user("user-1"),
				Action::GetProfile,
				Resource::user("user-1"),
			));
			let shadowed: Vec<_> = explanation
				.shadowed()
				.map(|trace| trace.policy_id.as_str())
				.collect();
			assert_eq!(shadowed, vec!["freeze-profiles-100", ids::DEFAULT_DENY]);
			assert_eq!(explanation.traces.len(), engine.policies().len());
		}
	}

	mod registration {
		use super::*;

		#[test]
		fn rejects_duplicate_ids() {
			let mut engine = engine();
			let result = engine.add_policy(Policy::permit(ids::FILE_MANAGEMENT, 450));
			assert_eq!(
				result,
				Err(AuthzError::DuplicatePolicyId(ids::FILE_MANAGEMENT.to_string()))
			);
		}

		#[test]
		fn rejects_reserved_and_out_of_range_priorities() {
			let mut engine = engine();
			for priority in [i32::MIN, -5, DEFAULT_DENY_PRIORITY, SECURITY_GUARD_PRIORITY, 5000] {
				let result = engine.add_policy(Policy::permit("p", priority));
				assert!(
					matches!(result, Err(AuthzError::ReservedPriority { .. })),
					"priority {priority} accepted"
				);
			}
			assert!(engine.policy("p").is_none());
		}

		#[test]
		fn rejects_empty_ids() {
			let mut engine = engine();
			assert_eq!(
				engine.add_policy(Policy::permit("  ", 10)),
				Err(AuthzError::InvalidPolicyId)
			);
		}

		#[test]
		fn keeps_descending_order_and_stable_ties() {
			let mut engine = engine();
			engine.add_policy(Policy::permit("tie-a", 500)).unwrap();
			engine.add_policy(Policy::permit("tie-b", 500)).unwrap();
			engine.add_policy(Policy::permit("low", 1)).unwrap();

			let order: Vec<_> = engine.policies().iter().map(|p| p.id()).collect();
			let session = order.iter().position(|id| *id == ids::SESSION_MANAGEMENT).unwrap();
			assert_eq!(order[session + 1], "tie-a");
			assert_eq!(order[session + 2], "tie-b");
			assert_eq!(order[order.len() - 2], "low");
			assert_eq!(order.first(), Some(&ids::SECURITY_GUARD));
			assert_eq!(order.last(), Some(&ids::DEFAULT_DENY));

			for pair in engine.policies().windows(2) {
				assert!(pair[0].priority() >= pair[1].priority());
			}
		}

		#[test]
		fn with_policy_leaves_original_untouched() {
			let original = engine();
			let extended = original
				.with_policy(
					Policy::permit("service-list-files", 450)
						.principals(PrincipalSelector::Service)
						.actions([Action::ListFiles])
						.on(ResourceKind::File),
				)
				.unwrap();

			let request = AuthorizationRequest::new(
				Principal::service("indexer"),
				Action::ListFiles,
				Resource::wildcard(ResourceKind::File),
			);
			assert!(!original.is_authorized(&request).is_authorized);
			assert!(extended.is_authorized(&request).is_authorized);
			assert_eq!(original.policies().len() + 1, extended.policies().len());
		}

		#[test]
		fn with_policies_is_all_or_nothing() {
			let result = PolicyEngine::with_policies(
				Environment::Development,
				[Policy::permit("ok", 10), Policy::permit("ok", 20)],
			);
			assert_eq!(result.unwrap_err(), AuthzError::DuplicatePolicyId("ok".to_string()));
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;
		use std::collections::BTreeSet;

		const ORGS: [&str; 3] = ["org1", "org2", "org3"];
		const USERS: [&str; 3] = ["user-1", "user-2", "user-3"];

		fn arb_role() -> impl Strategy<Value = OrgRole> {
			prop_oneof![
				Just(OrgRole::Owner),
				Just(OrgRole::Admin),
				Just(OrgRole::BillingManager),
				Just(OrgRole::Member),
				Just(OrgRole::Other("viewer".to_string())),
			]
		}

		fn arb_known_action() -> impl Strategy<Value = Action> {
			prop::sample::select(Action::known())
		}

		fn arb_unknown_action() -> impl Strategy<Value = Action> {
			"[A-Z][a-zA-Z]{2,16}"
				.prop_map(|s| Action::parse(&s))
				.prop_filter("must be unknown", |action| action.is_unknown())
		}

		fn arb_kind() -> impl Strategy<Value = ResourceKind> {
			prop_oneof![
				Just(ResourceKind::Agent),
				Just(ResourceKind::Org),
				Just(ResourceKind::File),
				Just(ResourceKind::Session),
				Just(ResourceKind::Message),
				Just(ResourceKind::User),
				Just(ResourceKind::Invite),
				Just(ResourceKind::Report),
				Just(ResourceKind::Other("Bucket".to_string())),
			]
		}

		fn arb_user(test_principal: bool) -> impl Strategy<Value = Principal> {
			(
				prop::sample::select(USERS.to_vec()),
				prop::collection::vec((prop::sample::select(ORGS.to_vec()), arb_role()), 0..3),
			)
				.prop_map(move |(id, memberships)| {
					memberships.into_iter().fold(
						Principal::user(id).with_test_principal(test_principal),
						|principal, (org, role)| principal.with_membership(org, role),
					)
				})
		}

		fn arb_principal() -> impl Strategy<Value = Principal> {
			prop_oneof![
				arb_user(false),
				Just(Principal::anonymous()),
				Just(Principal::service("svc")),
			]
		}

		fn arb_resource() -> impl Strategy<Value = Resource> {
			let ids: Vec<&str> = USERS.iter().chain(ORGS.iter()).copied().chain(["*"]).collect();
			(
				arb_kind(),
				prop::sample::select(ids),
				prop::option::of(prop::sample::select(ORGS.to_vec())),
				prop::option::of(prop::sample::select(USERS.to_vec())),
				any::<bool>(),
				prop::collection::btree_set(prop::sample::select(ORGS.to_vec()), 0..3),
			)
				.prop_map(|(kind, id, org, owner, is_public, allowed)| {
					let mut resource = Resource::new(kind, id)
						.with_public(is_public)
						.with_allowed_orgs(allowed.into_iter().collect::<BTreeSet<_>>());
					if let Some(org) = org {
						resource = resource.with_org(org);
					}
					if let Some(owner) = owner {
						resource = resource.with_owner(owner);
					}
					resource
				})
		}

		proptest! {
			#[test]
			fn every_decision_has_a_matched_policy(
				principal in arb_principal(),
				action in arb_known_action(),
				resource in arb_resource(),
			) {
				let engine = engine();
				let decision = engine.is_authorized(&AuthorizationRequest::new(principal, action, resource));

				prop_assert!(decision.diagnostics.policies_evaluated >= 1);
				let matched = decision.matched_policy().unwrap();
				let policy = engine.policy(matched).unwrap();
				prop_assert_eq!(decision.is_authorized, policy.effect().is_permit());
			}

			#[test]
			fn unknown_actions_always_reach_default_deny(
				principal in arb_principal(),
				action in arb_unknown_action(),
				resource in arb_resource(),
			) {
				let decision = engine().is_authorized(&AuthorizationRequest::new(principal, action, resource));
				prop_assert!(!decision.is_authorized);
				prop_assert_eq!(decision.matched_policy(), Some(ids::DEFAULT_DENY));
			}

			#[test]
			fn test_principals_are_always_blocked_in_production(
				principal in arb_user(true),
				action in arb_known_action(),
				resource in arb_resource(),
			) {
				let decision = prod_engine().is_authorized(&AuthorizationRequest::new(principal, action, resource));
				prop_assert!(!decision.is_authorized);
				prop_assert_eq!(decision.matched_policy(), Some(ids::SECURITY_GUARD));
			}

			#[test]
			fn anonymous_only_ever_discovers_public_resources(
				action in arb_known_action(),
				resource in arb_resource(),
			) {
				let decision = engine().is_authorized(&AuthorizationRequest::new(
					Principal::anonymous(),
					action.clone(),
					resource.clone(),
				));
				if decision.is_authorized {
					prop_assert!(action.is_discovery());
					prop_assert!(resource.attributes.is_public);
				}
			}

			#[test]
			fn org_actions_never_cross_tenants(
				principal in arb_user(false),
				action in prop::sample::select(vec![
					Action::InviteMember, Action::UpdateOrg, Action::DeleteOrg,
					Action::ConfigureSso, Action::VerifyDomain, Action::RemoveMember,
					Action::UpdateMemberRole, Action::GetOrg, Action::ViewBilling,
					Action::ViewUsage, Action::ManageBilling,
				]),
			) {
				let decision = engine().is_authorized(&AuthorizationRequest::new(
					principal,
					action,
					Resource::org("org-outside"),
				));
				prop_assert!(!decision.is_authorized);
			}

			#[test]
			fn evaluation_is_idempotent_and_matches_explain(
				principal in arb_principal(),
				action in arb_known_action(),
				resource in arb_resource(),
			) {
				let engine = engine();
				let request = AuthorizationRequest::new(principal, action, resource);
				let first = engine.is_authorized(&request);
				let second = engine.is_authorized(&request.clone());
				prop_assert_eq!(&first, &second);
				prop_assert_eq!(&engine.explain(&request).decision, &first);
			}
		}
	}
}
