// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the authorization model.
//!
//! - **ID newtypes**: string wrappers for principals, organizations and
//!   resources ([`PrincipalId`], [`OrgId`], [`ResourceId`]) so the three are
//!   never mixed up at a call site
//! - **Kinds**: [`PrincipalKind`] and [`ResourceKind`]
//! - **Roles**: [`OrgRole`], one per organization membership
//! - **Actions**: the centrally registered [`Action`] identifiers
//! - **Environment**: the deployment signal consumed by the security guard
//!
//! [`Action`], [`ResourceKind`] and [`OrgRole`] accept arbitrary strings on
//! the way in. Values that are not recognised are kept verbatim so they can be
//! logged, but no built-in policy ever matches them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create a new ID from any string-like value.
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			/// Borrow the ID as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Get the inner string value.
			pub fn into_inner(self) -> String {
				self.0
			}

			/// Returns true if the ID is empty or whitespace only.
			pub fn is_blank(&self) -> bool {
				self.0.trim().is_empty()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}

		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
	};
}

define_id_type!(PrincipalId, "Unique identifier for a principal (user or service).");
define_id_type!(OrgId, "Unique identifier for an organization.");
define_id_type!(ResourceId, "Identifier of a resource, or `*` for the whole resource type.");

impl ResourceId {
	/// Sentinel meaning "the resource type as a whole", used by list actions.
	pub const WILDCARD: &'static str = "*";

	/// Returns the wildcard resource ID.
	pub fn wildcard() -> Self {
		Self(Self::WILDCARD.to_string())
	}

	/// Returns true if this ID is the wildcard sentinel.
	pub fn is_wildcard(&self) -> bool {
		self.0 == Self::WILDCARD
	}
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment the engine is running in.
///
/// Only [`Environment::Production`] changes evaluation: it arms the
/// test-principal guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	Development,
	Beta,
	Gamma,
	Production,
}

impl Environment {
	/// Returns true for the production environment.
	pub fn is_production(&self) -> bool {
		matches!(self, Environment::Production)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Environment::Development => "development",
			Environment::Beta => "beta",
			Environment::Gamma => "gamma",
			Environment::Production => "production",
		}
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when an environment name is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected development, beta, gamma or production)")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
	type Err = UnknownEnvironment;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Environment::Development),
			"beta" => Ok(Environment::Beta),
			"gamma" => Ok(Environment::Gamma),
			"production" | "prod" => Ok(Environment::Production),
			_ => Err(UnknownEnvironment(s.to_string())),
		}
	}
}

// =============================================================================
// Principal Kinds
// =============================================================================

/// The kind of actor making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
	/// A signed-in human user.
	User,
	/// A visitor without a session.
	Anonymous,
	/// A machine identity. No built-in policy grants services anything.
	Service,
}

impl fmt::Display for PrincipalKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PrincipalKind::User => write!(f, "user"),
			PrincipalKind::Anonymous => write!(f, "anonymous"),
			PrincipalKind::Service => write!(f, "service"),
		}
	}
}

// =============================================================================
// Organization Roles
// =============================================================================

/// Role held within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrgRole {
	/// Full org control, billing, can delete org.
	Owner,
	/// Manage members and settings, cannot delete org.
	Admin,
	/// Can manage billing without administering the org.
	BillingManager,
	/// Standard member access.
	Member,
	/// A role string the engine does not know. Counts as membership only.
	Other(String),
}

impl OrgRole {
	/// Parses a role string. Unknown roles are preserved as [`OrgRole::Other`].
	pub fn parse(role: &str) -> Self {
		match role.trim().to_ascii_lowercase().as_str() {
			"owner" => OrgRole::Owner,
			"admin" => OrgRole::Admin,
			"billing_manager" => OrgRole::BillingManager,
			"member" => OrgRole::Member,
			_ => OrgRole::Other(role.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			OrgRole::Owner => "owner",
			OrgRole::Admin => "admin",
			OrgRole::BillingManager => "billing_manager",
			OrgRole::Member => "member",
			OrgRole::Other(role) => role,
		}
	}
}

impl fmt::Display for OrgRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<String> for OrgRole {
	fn from(role: String) -> Self {
		match OrgRole::parse(&role) {
			OrgRole::Other(_) => OrgRole::Other(role),
			known => known,
		}
	}
}

impl From<&str> for OrgRole {
	fn from(role: &str) -> Self {
		OrgRole::parse(role)
	}
}

impl From<OrgRole> for String {
	fn from(role: OrgRole) -> Self {
		match role {
			OrgRole::Other(role) => role,
			known => known.as_str().to_string(),
		}
	}
}

// =============================================================================
// Resource Kinds
// =============================================================================

/// Types of resources the engine protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
	Agent,
	Org,
	File,
	Session,
	Message,
	User,
	Invite,
	Report,
	/// Unrecognised kind; never matched by a built-in policy.
	Other(String),
}

impl ResourceKind {
	pub fn parse(kind: &str) -> Self {
		match kind {
			"Agent" => ResourceKind::Agent,
			"Org" => ResourceKind::Org,
			"File" => ResourceKind::File,
			"Session" => ResourceKind::Session,
			"Message" => ResourceKind::Message,
			"User" => ResourceKind::User,
			"Invite" => ResourceKind::Invite,
			"Report" => ResourceKind::Report,
			other => ResourceKind::Other(other.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			ResourceKind::Agent => "Agent",
			ResourceKind::Org => "Org",
			ResourceKind::File => "File",
			ResourceKind::Session => "Session",
			ResourceKind::Message => "Message",
			ResourceKind::User => "User",
			ResourceKind::Invite => "Invite",
			ResourceKind::Report => "Report",
			ResourceKind::Other(kind) => kind,
		}
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<String> for ResourceKind {
	fn from(kind: String) -> Self {
		ResourceKind::parse(&kind)
	}
}

impl From<&str> for ResourceKind {
	fn from(kind: &str) -> Self {
		ResourceKind::parse(kind)
	}
}

impl From<ResourceKind> for String {
	fn from(kind: ResourceKind) -> Self {
		match kind {
			ResourceKind::Other(kind) => kind,
			known => known.as_str().to_string(),
		}
	}
}

// =============================================================================
// Actions
// =============================================================================

macro_rules! define_actions {
	($($variant:ident => $name:literal),+ $(,)?) => {
		/// Operations that can be requested against a resource.
		///
		/// Wire names are the PascalCase identifiers used across the platform
		/// (`"InviteMember"`, `"ConfigureSSO"`, ...).
		#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(from = "String", into = "String")]
		pub enum Action {
			$($variant,)+
			/// An identifier the engine does not know. Always denied.
			Unknown(String),
		}

		impl Action {
			/// Every registered action, in declaration order.
			pub fn known() -> Vec<Action> {
				vec![$(Action::$variant),+]
			}

			pub fn parse(action: &str) -> Self {
				match action {
					$($name => Action::$variant,)+
					other => Action::Unknown(other.to_string()),
				}
			}

			pub fn as_str(&self) -> &str {
				match self {
					$(Action::$variant => $name,)+
					Action::Unknown(action) => action,
				}
			}
		}
	};
}

define_actions! {
	ListAgents => "ListAgents",
	GetAgent => "GetAgent",
	QueryAgent => "QueryAgent",
	GetProfile => "GetProfile",
	UpdateProfile => "UpdateProfile",
	ListMemberships => "ListMemberships",
	CreateOrg => "CreateOrg",
	GetOrg => "GetOrg",
	UpdateOrg => "UpdateOrg",
	DeleteOrg => "DeleteOrg",
	InviteMember => "InviteMember",
	RemoveMember => "RemoveMember",
	UpdateMemberRole => "UpdateMemberRole",
	ConfigureSso => "ConfigureSSO",
	VerifyDomain => "VerifyDomain",
	CreateSession => "CreateSession",
	ListSessions => "ListSessions",
	GetSession => "GetSession",
	DeleteSession => "DeleteSession",
	UploadFile => "UploadFile",
	ListFiles => "ListFiles",
	GetFile => "GetFile",
	DeleteFile => "DeleteFile",
	ViewBilling => "ViewBilling",
	ViewUsage => "ViewUsage",
	ManageBilling => "ManageBilling",
}

impl Action {
	/// Listing/discovery actions, the only ones open to anonymous visitors.
	pub fn is_discovery(&self) -> bool {
		matches!(self, Action::ListAgents | Action::GetAgent)
	}

	/// Returns true if the identifier was not recognised.
	pub fn is_unknown(&self) -> bool {
		matches!(self, Action::Unknown(_))
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<String> for Action {
	fn from(action: String) -> Self {
		match Action::parse(&action) {
			Action::Unknown(_) => Action::Unknown(action),
			known => known,
		}
	}
}

impl From<&str> for Action {
	fn from(action: &str) -> Self {
		Action::parse(action)
	}
}

impl From<Action> for String {
	fn from(action: Action) -> Self {
		match action {
			Action::Unknown(action) => action,
			known => known.as_str().to_string(),
		}
	}
}
