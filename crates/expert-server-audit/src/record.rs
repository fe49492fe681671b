// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The decision record written to sinks.

use std::fmt;

use chrono::{DateTime, Utc};
use expert_server_authz::{AuthorizationDecision, AuthorizationRequest, PrincipalKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
	Permit,
	Deny,
}

impl DecisionOutcome {
	pub fn is_permit(&self) -> bool {
		matches!(self, DecisionOutcome::Permit)
	}
}

impl From<bool> for DecisionOutcome {
	fn from(is_authorized: bool) -> Self {
		if is_authorized {
			DecisionOutcome::Permit
		} else {
			DecisionOutcome::Deny
		}
	}
}

impl fmt::Display for DecisionOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DecisionOutcome::Permit => write!(f, "permit"),
			DecisionOutcome::Deny => write!(f, "deny"),
		}
	}
}

/// Which way a message was travelling when an agent query was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	Inbound,
	Outbound,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Direction::Inbound => write!(f, "inbound"),
			Direction::Outbound => write!(f, "outbound"),
		}
	}
}

/// Caller-supplied metadata attached to a logged decision.
///
/// Fields left unset fall back to the request's [`RequestContext`]
/// (`active_org_id`, `ip_address`, `user_agent`) when one is present.
///
/// [`RequestContext`]: expert_server_authz::RequestContext
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionLogContext {
	pub org_id: Option<String>,
	pub agent_id: Option<String>,
	pub direction: Option<Direction>,
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
}

impl DecisionLogContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: set org_id.
	pub fn org(mut self, org_id: impl Into<String>) -> Self {
		self.org_id = Some(org_id.into());
		self
	}

	/// Builder: set agent_id.
	pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
		self.agent_id = Some(agent_id.into());
		self
	}

	/// Builder: set direction.
	pub fn direction(mut self, direction: Direction) -> Self {
		self.direction = Some(direction);
		self
	}

	/// Builder: set ip_address.
	pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	/// Builder: set user_agent.
	pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}
}

/// One authorization decision, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub principal_id: String,
	pub principal_kind: PrincipalKind,
	pub action: String,
	pub resource_kind: String,
	pub resource_id: String,
	pub decision: DecisionOutcome,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub matched_policy: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	pub policies_evaluated: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub org_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agent_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub direction: Option<Direction>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ip_address: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
}

impl DecisionRecord {
	pub fn builder(decision: DecisionOutcome) -> DecisionRecordBuilder {
		DecisionRecordBuilder::new(decision)
	}

	/// Builds the record for an evaluated request.
	pub fn from_evaluation(
		request: &AuthorizationRequest,
		decision: &AuthorizationDecision,
		context: &DecisionLogContext,
	) -> Self {
		let request_context = request.context.as_ref();
		let org_id = context.org_id.clone().or_else(|| {
			request_context
				.and_then(|c| c.active_org_id.as_ref())
				.map(|org| org.to_string())
		});
		let ip_address = context
			.ip_address
			.clone()
			.or_else(|| request_context.and_then(|c| c.ip_address.clone()));
		let user_agent = context
			.user_agent
			.clone()
			.or_else(|| request_context.and_then(|c| c.user_agent.clone()));

		let mut builder = DecisionRecordBuilder::new(decision.is_authorized.into())
			.principal(request.principal.kind, request.principal.id.as_str())
			.action(request.action.as_str())
			.resource(request.resource.kind.as_str(), request.resource.id.as_str())
			.policies_evaluated(decision.diagnostics.policies_evaluated);

		if let Some(policy) = decision.matched_policy() {
			builder = builder.matched_policy(policy);
		}
		if let Some(reason) = &decision.reason {
			builder = builder.reason(reason.clone());
		}
		if let Some(org_id) = org_id {
			builder = builder.org(org_id);
		}
		if let Some(agent_id) = &context.agent_id {
			builder = builder.agent(agent_id.clone());
		}
		if let Some(direction) = context.direction {
			builder = builder.direction(direction);
		}
		if let Some(ip) = ip_address {
			builder = builder.ip_address(ip);
		}
		if let Some(ua) = user_agent {
			builder = builder.user_agent(ua);
		}

		builder.build()
	}
}

pub struct DecisionRecordBuilder {
	decision: DecisionOutcome,
	principal_id: Option<String>,
	principal_kind: PrincipalKind,
	action: Option<String>,
	resource_kind: Option<String>,
	resource_id: Option<String>,
	matched_policy: Option<String>,
	reason: Option<String>,
	policies_evaluated: usize,
	org_id: Option<String>,
	agent_id: Option<String>,
	direction: Option<Direction>,
	ip_address: Option<String>,
	user_agent: Option<String>,
}

impl DecisionRecordBuilder {
	pub fn new(decision: DecisionOutcome) -> Self {
		Self {
			decision,
			principal_id: None,
			principal_kind: PrincipalKind::Anonymous,
			action: None,
			resource_kind: None,
			resource_id: None,
			matched_policy: None,
			reason: None,
			policies_evaluated: 0,
			org_id: None,
			agent_id: None,
			direction: None,
			ip_address: None,
			user_agent: None,
		}
	}

	pub fn principal(mut self, kind: PrincipalKind, id: impl Into<String>) -> Self {
		self.principal_kind = kind;
		self.principal_id = Some(id.into());
		self
	}

	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn resource(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
		self.resource_kind = Some(kind.into());
		self.resource_id = Some(id.into());
		self
	}

	pub fn matched_policy(mut self, policy_id: impl Into<String>) -> Self {
		self.matched_policy = Some(policy_id.into());
		self
	}

	pub fn reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn policies_evaluated(mut self, count: usize) -> Self {
		self.policies_evaluated = count;
		self
	}

	pub fn org(mut self, org_id: impl Into<String>) -> Self {
		self.org_id = Some(org_id.into());
		self
	}

	pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
		self.agent_id = Some(agent_id.into());
		self
	}

	pub fn direction(mut self, direction: Direction) -> Self {
		self.direction = Some(direction);
		self
	}

	pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	pub fn build(self) -> DecisionRecord {
		DecisionRecord {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			principal_id: self
				.principal_id
				.unwrap_or_else(|| expert_server_authz::ANONYMOUS_PRINCIPAL_ID.to_string()),
			principal_kind: self.principal_kind,
			action: self.action.unwrap_or_default(),
			resource_kind: self.resource_kind.unwrap_or_default(),
			resource_id: self.resource_id.unwrap_or_default(),
			decision: self.decision,
			matched_policy: self.matched_policy,
			reason: self.reason,
			policies_evaluated: self.policies_evaluated,
			org_id: self.org_id,
			agent_id: self.agent_id,
			direction: self.direction,
			ip_address: self.ip_address,
			user_agent: self.user_agent,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use expert_server_authz::{
		Action, Environment, OrgRole, PolicyEngine, Principal, RequestContext, Resource,
	};

	fn evaluate(request: &AuthorizationRequest) -> AuthorizationDecision {
		PolicyEngine::new(Environment::Development).is_authorized(request)
	}

	#[test]
	fn builder_defaults_to_anonymous() {
		let record = DecisionRecord::builder(DecisionOutcome::Deny).build();
		assert_eq!(record.principal_kind, PrincipalKind::Anonymous);
		assert_eq!(record.principal_id, "anonymous");
		assert_eq!(record.decision, DecisionOutcome::Deny);
	}

	#[test]
	fn builder_assigns_unique_ids() {
		let a = DecisionRecord::builder(DecisionOutcome::Permit).build();
		let b = DecisionRecord::builder(DecisionOutcome::Permit).build();
		assert_ne!(a.id, b.id);
	}

	#[test]
	fn from_evaluation_copies_decision() {
		let request = AuthorizationRequest::new(
			Principal::user("user-1").with_membership("org1", OrgRole::Owner),
			Action::DeleteOrg,
			Resource::org("org1"),
		);
		let decision = evaluate(&request);
		let record = DecisionRecord::from_evaluation(&request, &decision, &DecisionLogContext::new());

		assert_eq!(record.decision, DecisionOutcome::Permit);
		assert_eq!(record.principal_id, "user-1");
		assert_eq!(record.principal_kind, PrincipalKind::User);
		assert_eq!(record.action, "DeleteOrg");
		assert_eq!(record.resource_kind, "Org");
		assert_eq!(record.resource_id, "org1");
		assert_eq!(record.matched_policy.as_deref(), Some("org-owner-manage"));
		assert_eq!(
			record.policies_evaluated,
			decision.diagnostics.policies_evaluated
		);
	}

	#[test]
	fn explicit_context_wins_over_request_context() {
		let request = AuthorizationRequest::new(
			Principal::user("user-1"),
			Action::QueryAgent,
			Resource::agent("agent-7"),
		)
		.with_context(
			RequestContext::new()
				.with_active_org("org-from-request")
				.with_ip_address("10.0.0.1")
				.with_user_agent("curl/8"),
		);
		let decision = evaluate(&request);
		let context = DecisionLogContext::new()
			.org("org-explicit")
			.agent("agent-7")
			.direction(Direction::Inbound);

		let record = DecisionRecord::from_evaluation(&request, &decision, &context);
		assert_eq!(record.org_id.as_deref(), Some("org-explicit"));
		assert_eq!(record.agent_id.as_deref(), Some("agent-7"));
		assert_eq!(record.direction, Some(Direction::Inbound));
		assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
		assert_eq!(record.user_agent.as_deref(), Some("curl/8"));
	}

	#[test]
	fn serializes_snake_case_and_skips_empty_fields() {
		let record = DecisionRecord::builder(DecisionOutcome::Deny)
			.principal(PrincipalKind::Service, "indexer")
			.action("ListFiles")
			.resource("File", "*")
			.direction(Direction::Outbound)
			.build();
		let json = serde_json::to_value(&record).unwrap();

		assert_eq!(json["decision"], "deny");
		assert_eq!(json["principal_kind"], "service");
		assert_eq!(json["direction"], "outbound");
		assert!(json.get("matched_policy").is_none());
		assert!(json.get("org_id").is_none());
	}
}
