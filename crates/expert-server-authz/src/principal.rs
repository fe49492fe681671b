// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Building a [`Principal`] from the authenticated session.
//!
//! The session layer hands over whatever it has: possibly no session, possibly
//! a session without a user, and the user's org memberships as stored. This
//! module turns that into the principal the engine evaluates. It never fails;
//! anything unusable degrades toward the anonymous principal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::Principal;
use crate::types::{OrgId, OrgRole};

/// Session as produced by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
	#[serde(default)]
	pub user: Option<SessionUser>,
}

/// The signed-in user carried by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub auth_provider: Option<String>,
	#[serde(default)]
	pub is_test_user: bool,
}

/// One organization membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub org_id: OrgId,
	pub role: OrgRole,
}

impl Membership {
	pub fn new(org_id: impl Into<OrgId>, role: impl Into<OrgRole>) -> Self {
		Self {
			org_id: org_id.into(),
			role: role.into(),
		}
	}
}

/// Builds the principal for a request.
///
/// - No session, no user, or a blank user id gives the anonymous principal.
/// - Memberships with a blank org id are skipped.
/// - If an org appears more than once, the first role wins.
pub fn build_principal(session: Option<&AuthSession>, memberships: &[Membership]) -> Principal {
	let Some(user) = session.and_then(|session| session.user.as_ref()) else {
		return Principal::anonymous();
	};
	let Some(user_id) = user
		.id
		.as_deref()
		.map(str::trim)
		.filter(|id| !id.is_empty())
	else {
		debug!("session user has no id; treating as anonymous");
		return Principal::anonymous();
	};

	let mut principal = Principal::user(user_id).with_test_principal(user.is_test_user);
	if let Some(email) = &user.email {
		principal = principal.with_email(email.clone());
	}
	if let Some(provider) = &user.auth_provider {
		principal = principal.with_auth_provider(provider.clone());
	}

	for membership in memberships {
		if membership.org_id.is_blank() {
			debug!(principal_id = user_id, "skipping membership with empty org id");
			continue;
		}
		if principal.role_in(membership.org_id.as_str()).is_some() {
			debug!(
				principal_id = user_id,
				org_id = %membership.org_id,
				"duplicate membership; keeping first role"
			);
			continue;
		}
		principal = principal.with_membership(membership.org_id.clone(), membership.role.clone());
	}

	principal
}
