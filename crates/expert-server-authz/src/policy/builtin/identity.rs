// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Anonymous access, self-service profile and org creation policies.

use super::ids;
use crate::policy::rule::{ActionSelector, Condition, Policy, PrincipalSelector};
use crate::types::{Action, ResourceKind};

/// Anonymous visitors may only list or discover public resources.
pub fn anonymous_public_only() -> Policy {
	Policy::permit(ids::ANONYMOUS_PUBLIC_ONLY, 900)
		.describe("Anonymous visitors may discover public resources")
		.principals(PrincipalSelector::Anonymous)
		.action_selector(ActionSelector::Discovery)
		.when(Condition::ResourceIsPublic)
}

/// Users may read and update their own profile.
pub fn user_own_profile() -> Policy {
	Policy::permit(ids::USER_OWN_PROFILE, 800)
		.describe("Users can access their own profile")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::GetProfile, Action::UpdateProfile])
		.on(ResourceKind::User)
		.when(Condition::ResourceIsSelf)
}

/// Any signed-in user may enumerate their own memberships.
pub fn user_list_memberships() -> Policy {
	Policy::permit(ids::USER_LIST_MEMBERSHIPS, 790)
		.describe("Users can list their own memberships")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::ListMemberships])
}

/// Any signed-in user may create an organization. The org does not exist yet,
/// so there is nothing resource-scoped to check.
pub fn user_create_org() -> Policy {
	Policy::permit(ids::USER_CREATE_ORG, 570)
		.describe("Authenticated users can create organizations")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::CreateOrg])
}
