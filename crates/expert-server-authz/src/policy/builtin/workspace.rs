// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Chat session and file policies.

use super::ids;
use crate::policy::rule::{Condition, OrgScope, Policy, PrincipalSelector};
use crate::types::{Action, ResourceKind};

/// Users may create and list sessions freely; reading or deleting a single
/// session requires owning it.
pub fn session_management() -> Policy {
	Policy::permit(ids::SESSION_MANAGEMENT, 500)
		.describe("Users manage their own sessions")
		.principals(PrincipalSelector::Authenticated)
		.actions([
			Action::CreateSession,
			Action::ListSessions,
			Action::GetSession,
			Action::DeleteSession,
		])
		.on(ResourceKind::Session)
		.when(Condition::any([
			Condition::action_in([Action::CreateSession, Action::ListSessions]),
			Condition::OwnsResource,
		]))
}

/// Users may upload and list files freely; reading or deleting a file
/// requires owning it or belonging to the org the file is attached to.
pub fn file_management() -> Policy {
	Policy::permit(ids::FILE_MANAGEMENT, 400)
		.describe("Users access files they own or that belong to their org")
		.principals(PrincipalSelector::Authenticated)
		.actions([
			Action::UploadFile,
			Action::ListFiles,
			Action::GetFile,
			Action::DeleteFile,
		])
		.on(ResourceKind::File)
		.when(Condition::any([
			Condition::action_in([Action::UploadFile, Action::ListFiles]),
			Condition::OwnsResource,
			Condition::MemberOfOrg {
				scope: OrgScope::ResourceOrg,
			},
		]))
}
