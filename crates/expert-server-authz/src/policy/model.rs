// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request model for policy evaluation.
//!
//! - [`Principal`]: who is asking (kind, id, memberships and roles)
//! - [`Resource`]: what is being acted on (kind, id, ownership and visibility)
//! - [`RequestContext`]: request-time metadata carried for audit
//! - [`AuthorizationRequest`]: the tuple handed to the engine
//!
//! # Design Principles
//!
//! 1. **Pre-loaded attributes**: callers resolve every attribute before
//!    evaluation; the engine performs no lookups
//! 2. **Immutable evaluation**: the engine only borrows a request
//! 3. **Deterministic**: sets and maps are ordered so identical requests
//!    serialize identically

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthzError;
use crate::types::{Action, OrgId, OrgRole, PrincipalId, PrincipalKind, ResourceId, ResourceKind};

/// Identifier used for every anonymous principal.
pub const ANONYMOUS_PRINCIPAL_ID: &str = "anonymous";

/// Optional attributes describing a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalAttributes {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default)]
	pub org_ids: BTreeSet<OrgId>,
	#[serde(default)]
	pub roles: BTreeMap<OrgId, OrgRole>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth_provider: Option<String>,
	#[serde(default)]
	pub is_test_principal: bool,
}

/// The actor attempting an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub kind: PrincipalKind,
	pub id: PrincipalId,
	#[serde(default)]
	pub attributes: PrincipalAttributes,
}

impl Principal {
	/// The anonymous principal. Carries no attributes.
	pub fn anonymous() -> Self {
		Self {
			kind: PrincipalKind::Anonymous,
			id: PrincipalId::new(ANONYMOUS_PRINCIPAL_ID),
			attributes: PrincipalAttributes::default(),
		}
	}

	/// Creates an authenticated user with no memberships.
	pub fn user(id: impl Into<PrincipalId>) -> Self {
		Self {
			kind: PrincipalKind::User,
			id: id.into(),
			attributes: PrincipalAttributes::default(),
		}
	}

	/// Creates a service principal.
	pub fn service(id: impl Into<PrincipalId>) -> Self {
		Self {
			kind: PrincipalKind::Service,
			id: id.into(),
			attributes: PrincipalAttributes::default(),
		}
	}

	/// Builder: add an organization membership with its role.
	///
	/// The org is recorded in both `org_ids` and `roles`. Anonymous principals
	/// never carry memberships, so this is a no-op for them.
	pub fn with_membership(mut self, org_id: impl Into<OrgId>, role: impl Into<OrgRole>) -> Self {
		if self.is_anonymous() {
			return self;
		}
		let org_id = org_id.into();
		self.attributes.org_ids.insert(org_id.clone());
		self.attributes.roles.insert(org_id, role.into());
		self
	}

	/// Builder: set email.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.attributes.email = Some(email.into());
		self
	}

	/// Builder: set auth_provider.
	pub fn with_auth_provider(mut self, provider: impl Into<String>) -> Self {
		self.attributes.auth_provider = Some(provider.into());
		self
	}

	/// Builder: mark the principal as a test identity.
	pub fn with_test_principal(mut self, is_test: bool) -> Self {
		self.attributes.is_test_principal = is_test;
		self
	}

	pub fn is_anonymous(&self) -> bool {
		self.kind == PrincipalKind::Anonymous
	}

	/// Returns true for signed-in users. Services are not "authenticated users".
	pub fn is_authenticated_user(&self) -> bool {
		self.kind == PrincipalKind::User
	}

	pub fn is_test_principal(&self) -> bool {
		self.attributes.is_test_principal
	}

	/// Returns the role for the given organization, if any.
	///
	/// A role is only honoured for an org the principal is a member of, so a
	/// `roles` entry without the matching `org_ids` entry grants nothing.
	pub fn role_in(&self, org_id: &str) -> Option<&OrgRole> {
		if !self.is_member_of(org_id) {
			return None;
		}
		self.attributes.roles.get(org_id)
	}

	/// Returns true if the principal holds one of `roles` in the organization.
	pub fn has_role_in(&self, org_id: &str, roles: &[OrgRole]) -> bool {
		self
			.role_in(org_id)
			.map(|role| roles.contains(role))
			.unwrap_or(false)
	}

	/// Returns true if the organization is in the principal's `org_ids`.
	pub fn is_member_of(&self, org_id: &str) -> bool {
		self.attributes.org_ids.contains(org_id)
	}

	/// Returns true if any of the principal's organizations is in `org_ids`.
	pub fn shares_org_with(&self, org_ids: &BTreeSet<OrgId>) -> bool {
		!self.attributes.org_ids.is_disjoint(org_ids)
	}

	/// Checks the structural invariants of a principal built outside the
	/// constructors (for example, deserialized from JSON).
	pub fn validate(&self) -> Result<(), AuthzError> {
		if self.id.is_blank() {
			return Err(AuthzError::InvalidRequest(
				"principal id must not be empty".to_string(),
			));
		}
		if self.is_anonymous() && !self.attributes.roles.is_empty() {
			return Err(AuthzError::InvalidRequest(
				"anonymous principal must not carry roles".to_string(),
			));
		}
		if let Some(org_id) = self
			.attributes
			.roles
			.keys()
			.find(|org_id| !self.attributes.org_ids.contains(*org_id))
		{
			return Err(AuthzError::InvalidRequest(format!(
				"principal has a role in '{org_id}' but is not a member of it"
			)));
		}
		Ok(())
	}
}

/// Optional attributes describing a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub org_id: Option<OrgId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<PrincipalId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<PrincipalId>,
	#[serde(default)]
	pub is_public: bool,
	#[serde(default)]
	pub is_beta: bool,
	#[serde(default)]
	pub allowed_org_ids: BTreeSet<OrgId>,
}

/// The target of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
	pub kind: ResourceKind,
	pub id: ResourceId,
	#[serde(default)]
	pub attributes: ResourceAttributes,
}

impl Resource {
	pub fn new(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
		Self {
			kind,
			id: id.into(),
			attributes: ResourceAttributes::default(),
		}
	}

	/// The resource type as a whole, for list-style actions.
	pub fn wildcard(kind: ResourceKind) -> Self {
		Self::new(kind, ResourceId::wildcard())
	}

	/// Creates an agent resource.
	pub fn agent(id: impl Into<ResourceId>) -> Self {
		Self::new(ResourceKind::Agent, id)
	}

	/// Creates an organization resource. The id is the organization id.
	pub fn org(id: impl Into<ResourceId>) -> Self {
		Self::new(ResourceKind::Org, id)
	}

	/// Creates a file resource.
	pub fn file(id: impl Into<ResourceId>) -> Self {
		Self::new(ResourceKind::File, id)
	}

	/// Creates a session resource.
	pub fn session(id: impl Into<ResourceId>) -> Self {
		Self::new(ResourceKind::Session, id)
	}

	/// Creates a user resource. The id is the user's principal id.
	pub fn user(id: impl Into<ResourceId>) -> Self {
		Self::new(ResourceKind::User, id)
	}

	/// Builder: set org_id.
	pub fn with_org(mut self, org_id: impl Into<OrgId>) -> Self {
		self.attributes.org_id = Some(org_id.into());
		self
	}

	/// Builder: set owner_id.
	pub fn with_owner(mut self, owner_id: impl Into<PrincipalId>) -> Self {
		self.attributes.owner_id = Some(owner_id.into());
		self
	}

	/// Builder: set user_id.
	pub fn with_user(mut self, user_id: impl Into<PrincipalId>) -> Self {
		self.attributes.user_id = Some(user_id.into());
		self
	}

	/// Builder: set is_public.
	pub fn with_public(mut self, is_public: bool) -> Self {
		self.attributes.is_public = is_public;
		self
	}

	/// Builder: set is_beta.
	pub fn with_beta(mut self, is_beta: bool) -> Self {
		self.attributes.is_beta = is_beta;
		self
	}

	/// Builder: restrict the resource to the given organizations.
	pub fn with_allowed_orgs<I, O>(mut self, org_ids: I) -> Self
	where
		I: IntoIterator<Item = O>,
		O: Into<OrgId>,
	{
		self
			.attributes
			.allowed_org_ids
			.extend(org_ids.into_iter().map(Into::into));
		self
	}

	pub fn is_wildcard(&self) -> bool {
		self.id.is_wildcard()
	}
}

/// Request-time metadata. Not consulted by built-in policies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub active_org_id: Option<OrgId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<DateTime<Utc>>,
}

impl RequestContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: set active_org_id.
	pub fn with_active_org(mut self, org_id: impl Into<OrgId>) -> Self {
		self.active_org_id = Some(org_id.into());
		self
	}

	/// Builder: set ip_address.
	pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	/// Builder: set user_agent.
	pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	/// Builder: set timestamp.
	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}
}

/// The `(principal, action, resource, context?)` tuple passed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	pub principal: Principal,
	pub action: Action,
	pub resource: Resource,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<RequestContext>,
}

impl AuthorizationRequest {
	pub fn new(principal: Principal, action: impl Into<Action>, resource: Resource) -> Self {
		Self {
			principal,
			action: action.into(),
			resource,
			context: None,
		}
	}

	/// Builder: attach request context.
	pub fn with_context(mut self, context: RequestContext) -> Self {
		self.context = Some(context);
		self
	}

	/// Checks structural invariants of a request assembled outside the
	/// builders. The engine itself never requires this to hold.
	pub fn validate(&self) -> Result<(), AuthzError> {
		self.principal.validate()?;
		if self.resource.id.is_blank() {
			return Err(AuthzError::InvalidRequest(
				"resource id must not be empty".to_string(),
			));
		}
		Ok(())
	}
}
