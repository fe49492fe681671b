// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative policies and the generic evaluator that interprets them.
//!
//! A [`Policy`] is data: a principal selector, an action selector, an optional
//! resource kind and a [`Condition`] tree. Every policy, built-in or
//! registered at runtime, goes through the same [`Policy::evaluate`] path.
//!
//! ```text
//! Policy ─┬─ PrincipalSelector  (who)
//!         ├─ ActionSelector     (what)
//!         ├─ ResourceKind?      (on which kind)
//!         └─ Condition          (attribute checks, composable)
//! ```
//!
//! [`Condition::Custom`] is the escape hatch for registered extensions. It is
//! the only condition that can fail; see [`PolicyPredicate`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::model::{AuthorizationRequest, Principal, Resource};
use crate::error::PredicateError;
use crate::types::{Action, Environment, OrgRole, PrincipalKind, ResourceKind};

/// The effect a policy declares when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
	Permit,
	Forbid,
}

impl Effect {
	pub fn is_permit(&self) -> bool {
		matches!(self, Effect::Permit)
	}
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Effect::Permit => write!(f, "permit"),
			Effect::Forbid => write!(f, "forbid"),
		}
	}
}

/// Environment-level facts available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationEnv {
	pub environment: Environment,
}

/// Result of evaluating one policy against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMatch {
	pub matches: bool,
	pub reason: Option<String>,
}

impl PolicyMatch {
	pub fn no_match() -> Self {
		Self {
			matches: false,
			reason: None,
		}
	}

	pub fn matched(reason: impl Into<String>) -> Self {
		Self {
			matches: true,
			reason: Some(reason.into()),
		}
	}
}

/// A runtime-registered predicate.
///
/// Returning `Err` means the predicate could not decide. The engine treats
/// that, and any panic, as "does not match" and logs the fault.
pub trait PolicyPredicate: Send + Sync + fmt::Debug {
	fn evaluate(&self, request: &AuthorizationRequest) -> Result<bool, PredicateError>;
}

/// Which principals a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalSelector {
	Any,
	Anonymous,
	/// Signed-in users only.
	Authenticated,
	Service,
}

impl PrincipalSelector {
	pub fn matches(&self, principal: &Principal) -> bool {
		match self {
			PrincipalSelector::Any => true,
			PrincipalSelector::Anonymous => principal.kind == PrincipalKind::Anonymous,
			PrincipalSelector::Authenticated => principal.kind == PrincipalKind::User,
			PrincipalSelector::Service => principal.kind == PrincipalKind::Service,
		}
	}
}

/// Which actions a policy applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSelector {
	Any,
	OneOf(Vec<Action>),
	/// Listing/discovery actions (see [`Action::is_discovery`]).
	Discovery,
}

impl ActionSelector {
	pub fn matches(&self, action: &Action) -> bool {
		match self {
			ActionSelector::Any => true,
			ActionSelector::OneOf(actions) => !action.is_unknown() && actions.contains(action),
			ActionSelector::Discovery => action.is_discovery(),
		}
	}
}

/// Where to find the organization a role or membership check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgScope {
	/// The resource is the organization; its id is the org id.
	ResourceId,
	/// The resource's `org_id` attribute.
	ResourceOrg,
	/// `ResourceId` for `Org` resources, `ResourceOrg` for everything else.
	Owning,
}

impl OrgScope {
	/// Resolves the org id. Wildcard org resources resolve to nothing.
	pub fn resolve<'a>(&self, resource: &'a Resource) -> Option<&'a str> {
		let from_id = || (!resource.is_wildcard()).then(|| resource.id.as_str());
		let from_attr = || resource.attributes.org_id.as_ref().map(|id| id.as_str());
		match self {
			OrgScope::ResourceId => from_id(),
			OrgScope::ResourceOrg => from_attr(),
			OrgScope::Owning if resource.kind == ResourceKind::Org => from_id(),
			OrgScope::Owning => from_attr(),
		}
	}
}

/// Attribute checks, composable with `All`, `Any` and `Not`.
#[derive(Debug, Clone)]
pub enum Condition {
	Always,
	All(Vec<Condition>),
	Any(Vec<Condition>),
	Not(Box<Condition>),
	/// The requested action is one of these.
	ActionIn(Vec<Action>),
	/// `resource.attributes.is_public`.
	ResourceIsPublic,
	/// `resource.attributes.allowed_org_ids` is empty.
	ResourceUnrestricted,
	/// The principal's orgs intersect `allowed_org_ids`.
	SharesAllowedOrg,
	/// `resource.id == principal.id`.
	ResourceIsSelf,
	/// `resource.attributes.owner_id == principal.id`.
	OwnsResource,
	/// The principal holds one of `roles` in the scoped org.
	HasOrgRole { scope: OrgScope, roles: Vec<OrgRole> },
	/// The principal holds any role in the scoped org.
	HasAnyOrgRole { scope: OrgScope },
	/// The scoped org is in the principal's `org_ids`.
	MemberOfOrg { scope: OrgScope },
	/// The principal is a test identity and the environment is production.
	TestPrincipalInProduction,
	Custom(Arc<dyn PolicyPredicate>),
}

impl Condition {
	pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
		Condition::All(conditions.into_iter().collect())
	}

	pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
		Condition::Any(conditions.into_iter().collect())
	}

	#[allow(clippy::should_implement_trait)]
	pub fn not(condition: Condition) -> Self {
		Condition::Not(Box::new(condition))
	}

	pub fn action_in(actions: impl IntoIterator<Item = Action>) -> Self {
		Condition::ActionIn(actions.into_iter().collect())
	}

	pub fn has_org_role(scope: OrgScope, roles: impl IntoIterator<Item = OrgRole>) -> Self {
		Condition::HasOrgRole {
			scope,
			roles: roles.into_iter().collect(),
		}
	}

	pub fn custom(predicate: impl PolicyPredicate + 'static) -> Self {
		Condition::Custom(Arc::new(predicate))
	}

	/// Evaluates the condition. `All` and `Any` short-circuit left to right,
	/// so a fault in a later branch is only raised if that branch is reached.
	pub fn evaluate(
		&self,
		request: &AuthorizationRequest,
		env: &EvaluationEnv,
	) -> Result<bool, PredicateError> {
		let principal = &request.principal;
		let resource = &request.resource;

		let result = match self {
			Condition::Always => true,
			Condition::All(conditions) => {
				for condition in conditions {
					if !condition.evaluate(request, env)? {
						return Ok(false);
					}
				}
				true
			}
			Condition::Any(conditions) => {
				for condition in conditions {
					if condition.evaluate(request, env)? {
						return Ok(true);
					}
				}
				false
			}
			Condition::Not(condition) => !condition.evaluate(request, env)?,
			Condition::ActionIn(actions) => {
				!request.action.is_unknown() && actions.contains(&request.action)
			}
			Condition::ResourceIsPublic => resource.attributes.is_public,
			Condition::ResourceUnrestricted => resource.attributes.allowed_org_ids.is_empty(),
			Condition::SharesAllowedOrg => principal.shares_org_with(&resource.attributes.allowed_org_ids),
			Condition::ResourceIsSelf => {
				!principal.id.is_blank() && resource.id.as_str() == principal.id.as_str()
			}
			Condition::OwnsResource => resource
				.attributes
				.owner_id
				.as_ref()
				.map(|owner| !owner.is_blank() && owner == &principal.id)
				.unwrap_or(false),
			Condition::HasOrgRole { scope, roles } => scope
				.resolve(resource)
				.map(|org_id| principal.has_role_in(org_id, roles))
				.unwrap_or(false),
			Condition::HasAnyOrgRole { scope } => scope
				.resolve(resource)
				.map(|org_id| principal.role_in(org_id).is_some())
				.unwrap_or(false),
			Condition::MemberOfOrg { scope } => scope
				.resolve(resource)
				.map(|org_id| principal.is_member_of(org_id))
				.unwrap_or(false),
			Condition::TestPrincipalInProduction => {
				principal.is_test_principal() && env.environment.is_production()
			}
			Condition::Custom(predicate) => predicate.evaluate(request)?,
		};

		Ok(result)
	}
}

/// The matching part of a policy.
#[derive(Debug, Clone)]
pub struct PolicyRule {
	pub principal: PrincipalSelector,
	pub actions: ActionSelector,
	pub resource_kind: Option<ResourceKind>,
	pub condition: Condition,
}

impl Default for PolicyRule {
	fn default() -> Self {
		Self {
			principal: PrincipalSelector::Any,
			actions: ActionSelector::Any,
			resource_kind: None,
			condition: Condition::Always,
		}
	}
}

/// A named, prioritized rule with a declared effect.
///
/// Built fluently:
///
/// ```
/// use expert_server_authz::{Action, Condition, Policy, PrincipalSelector, ResourceKind};
///
/// let policy = Policy::permit("report-owner-read", 450)
/// 	.describe("Report owners can read their reports")
/// 	.principals(PrincipalSelector::Authenticated)
/// 	.actions([Action::parse("GetReport")])
/// 	.on(ResourceKind::Report)
/// 	.when(Condition::OwnsResource);
/// assert_eq!(policy.id(), "report-owner-read");
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
	id: String,
	effect: Effect,
	priority: i32,
	description: String,
	rule: PolicyRule,
}

impl Policy {
	pub fn new(id: impl Into<String>, effect: Effect, priority: i32) -> Self {
		let id = id.into();
		Self {
			description: id.clone(),
			id,
			effect,
			priority,
			rule: PolicyRule::default(),
		}
	}

	pub fn permit(id: impl Into<String>, priority: i32) -> Self {
		Self::new(id, Effect::Permit, priority)
	}

	pub fn forbid(id: impl Into<String>, priority: i32) -> Self {
		Self::new(id, Effect::Forbid, priority)
	}

	/// Builder: human-readable reason reported when the policy matches.
	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// Builder: restrict to a kind of principal.
	pub fn principals(mut self, selector: PrincipalSelector) -> Self {
		self.rule.principal = selector;
		self
	}

	/// Builder: restrict to a set of actions.
	pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
		self.rule.actions = ActionSelector::OneOf(actions.into_iter().collect());
		self
	}

	/// Builder: restrict with an explicit action selector.
	pub fn action_selector(mut self, selector: ActionSelector) -> Self {
		self.rule.actions = selector;
		self
	}

	/// Builder: restrict to a resource kind.
	pub fn on(mut self, kind: ResourceKind) -> Self {
		self.rule.resource_kind = Some(kind);
		self
	}

	/// Builder: set the attribute condition.
	pub fn when(mut self, condition: Condition) -> Self {
		self.rule.condition = condition;
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn effect(&self) -> Effect {
		self.effect
	}

	pub fn priority(&self) -> i32 {
		self.priority
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn rule(&self) -> &PolicyRule {
		&self.rule
	}

	/// Evaluates the policy against a request.
	///
	/// Selectors are checked first and never fail. Only the condition tree can
	/// return an error, and only through a custom predicate.
	pub fn evaluate(
		&self,
		request: &AuthorizationRequest,
		env: &EvaluationEnv,
	) -> Result<PolicyMatch, PredicateError> {
		if !self.rule.principal.matches(&request.principal) {
			return Ok(PolicyMatch::no_match());
		}
		if !self.rule.actions.matches(&request.action) {
			return Ok(PolicyMatch::no_match());
		}
		if let Some(kind) = &self.rule.resource_kind {
			if kind != &request.resource.kind {
				return Ok(PolicyMatch::no_match());
			}
		}

		if self.rule.condition.evaluate(request, env)? {
			Ok(PolicyMatch::matched(self.description.clone()))
		} else {
			Ok(PolicyMatch::no_match())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dev() -> EvaluationEnv {
		EvaluationEnv {
			environment: Environment::Development,
		}
	}

	fn prod() -> EvaluationEnv {
		EvaluationEnv {
			environment: Environment::Production,
		}
	}

	fn request(principal: Principal, action: Action, resource: Resource) -> AuthorizationRequest {
		AuthorizationRequest::new(principal, action, resource)
	}

	#[derive(Debug)]
	struct Failing;

	impl PolicyPredicate for Failing {
		fn evaluate(&self, _request: &AuthorizationRequest) -> Result<bool, PredicateError> {
			Err(PredicateError::MissingAttribute("region".to_string()))
		}
	}

	mod selectors {
		use super::*;

		#[test]
		fn principal_selector_distinguishes_kinds() {
			let user = Principal::user("u");
			let anon = Principal::anonymous();
			let svc = Principal::service("svc");

			assert!(PrincipalSelector::Authenticated.matches(&user));
			assert!(!PrincipalSelector::Authenticated.matches(&anon));
			assert!(!PrincipalSelector::Authenticated.matches(&svc));
			assert!(PrincipalSelector::Anonymous.matches(&anon));
			assert!(PrincipalSelector::Service.matches(&svc));
			assert!(PrincipalSelector::Any.matches(&svc));
		}

		#[test]
		fn action_selector_never_matches_unknown_actions() {
			let selector = ActionSelector::OneOf(vec![Action::GetOrg]);
			assert!(selector.matches(&Action::GetOrg));
			assert!(!selector.matches(&Action::DeleteOrg));
			assert!(!selector.matches(&Action::parse("Whatever")));
			assert!(!ActionSelector::Discovery.matches(&Action::parse("Whatever")));
		}

		#[test]
		fn owning_scope_uses_id_for_orgs_and_attribute_otherwise() {
			let org = Resource::org("org1");
			let file = Resource::file("f1").with_org("org2");
			let bare_file = Resource::file("f2");
			assert_eq!(OrgScope::Owning.resolve(&org), Some("org1"));
			assert_eq!(OrgScope::Owning.resolve(&file), Some("org2"));
			assert_eq!(OrgScope::Owning.resolve(&bare_file), None);
			assert_eq!(OrgScope::ResourceId.resolve(&Resource::wildcard(ResourceKind::Org)), None);
		}
	}

	mod conditions {
		use super::*;

		#[test]
		fn resource_is_self_compares_ids() {
			let env = dev();
			let own = request(Principal::user("user-1"), Action::GetProfile, Resource::user("user-1"));
			let other = request(Principal::user("user-1"), Action::GetProfile, Resource::user("user-2"));
			assert!(Condition::ResourceIsSelf.evaluate(&own, &env).unwrap());
			assert!(!Condition::ResourceIsSelf.evaluate(&other, &env).unwrap());
		}

		#[test]
		fn owns_resource_requires_owner_attribute() {
			let env = dev();
			let owned = request(
				Principal::user("user-1"),
				Action::GetSession,
				Resource::session("s1").with_owner("user-1"),
			);
			let unowned = request(Principal::user("user-1"), Action::GetSession, Resource::session("s1"));
			assert!(Condition::OwnsResource.evaluate(&owned, &env).unwrap());
			assert!(!Condition::OwnsResource.evaluate(&unowned, &env).unwrap());
		}

		#[test]
		fn test_principal_condition_depends_on_environment() {
			let req = request(
				Principal::user("tester").with_test_principal(true),
				Action::GetOrg,
				Resource::org("org1"),
			);
			assert!(Condition::TestPrincipalInProduction
				.evaluate(&req, &prod())
				.unwrap());
			assert!(!Condition::TestPrincipalInProduction
				.evaluate(&req, &dev())
				.unwrap());
		}

		#[test]
		fn combinators_short_circuit() {
			let env = dev();
			let req = request(Principal::user("u"), Action::GetOrg, Resource::org("org1"));

			let any = Condition::any([Condition::Always, Condition::custom(Failing)]);
			assert!(any.evaluate(&req, &env).unwrap());

			let all = Condition::all([Condition::not(Condition::Always), Condition::custom(Failing)]);
			assert!(!all.evaluate(&req, &env).unwrap());
		}

		#[test]
		fn custom_fault_propagates() {
			let env = dev();
			let req = request(Principal::user("u"), Action::GetOrg, Resource::org("org1"));
			let result = Condition::custom(Failing).evaluate(&req, &env);
			assert_eq!(
				result,
				Err(PredicateError::MissingAttribute("region".to_string()))
			);
		}

		#[test]
		fn role_without_membership_grants_nothing() {
			let env = dev();
			let mut principal = Principal::user("user-1");
			principal.attributes.roles.insert("org1".into(), OrgRole::Owner);
			let req = request(principal, Action::DeleteOrg, Resource::org("org1"));

			let named = Condition::has_org_role(OrgScope::ResourceId, [OrgRole::Owner]);
			let any = Condition::HasAnyOrgRole {
				scope: OrgScope::ResourceId,
			};
			assert!(!named.evaluate(&req, &env).unwrap());
			assert!(!any.evaluate(&req, &env).unwrap());
		}
	}

	mod policy {
		use super::*;

		#[test]
		fn builder_sets_fields() {
			let policy = Policy::forbid("no-beta", 300)
				.describe("Beta agents are closed")
				.principals(PrincipalSelector::Authenticated)
				.actions([Action::QueryAgent])
				.on(ResourceKind::Agent);
			assert_eq!(policy.id(), "no-beta");
			assert_eq!(policy.effect(), Effect::Forbid);
			assert_eq!(policy.priority(), 300);
			assert_eq!(policy.description(), "Beta agents are closed");
			assert_eq!(policy.rule().resource_kind, Some(ResourceKind::Agent));
		}

		#[test]
		fn description_defaults_to_id() {
			assert_eq!(Policy::permit("p", 1).description(), "p");
		}

		#[test]
		fn match_reports_description_as_reason() {
			let policy = Policy::permit("any-org-read", 100)
				.describe("Anyone may read orgs")
				.actions([Action::GetOrg]);
			let req = request(Principal::user("u"), Action::GetOrg, Resource::org("org1"));
			let result = policy.evaluate(&req, &dev()).unwrap();
			assert!(result.matches);
			assert_eq!(result.reason.as_deref(), Some("Anyone may read orgs"));
		}

		#[test]
		fn resource_kind_mismatch_does_not_match() {
			let policy = Policy::permit("sessions", 100).on(ResourceKind::Session);
			let req = request(Principal::user("u"), Action::GetFile, Resource::file("f1"));
			assert_eq!(policy.evaluate(&req, &dev()).unwrap(), PolicyMatch::no_match());
		}
	}
}
