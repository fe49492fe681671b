// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Agent listing and query policies.

use super::ids;
use crate::policy::rule::{Condition, Policy, PrincipalSelector};
use crate::types::{Action, ResourceKind};

/// Signed-in users may list, view or query an agent when it is public, when
/// it is unrestricted, or when they belong to one of its allowed orgs.
pub fn agent_list_query() -> Policy {
	Policy::permit(ids::AGENT_LIST_QUERY, 700)
		.describe("Agent is visible to the user")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::ListAgents, Action::GetAgent, Action::QueryAgent])
		.on(ResourceKind::Agent)
		.when(Condition::any([
			Condition::ResourceIsPublic,
			Condition::ResourceUnrestricted,
			Condition::SharesAllowedOrg,
		]))
}
