// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The fixed policy set installed by [`PolicyEngine::new`](crate::PolicyEngine::new).
//!
//! Two boundary policies bracket everything else:
//!
//! | priority | policy | effect |
//! |---|---|---|
//! | 1000 | `security-guard` | forbid |
//! | 900 | `anonymous-public-only` | permit |
//! | 800 | `user-own-profile` | permit |
//! | 790 | `user-list-memberships` | permit |
//! | 700 | `agent-list-query` | permit |
//! | 600 | `org-admin-invite` | permit |
//! | 590 | `org-owner-manage` | permit |
//! | 580 | `org-member-view` | permit |
//! | 570 | `user-create-org` | permit |
//! | 500 | `session-management` | permit |
//! | 400 | `file-management` | permit |
//! | 300 | `billing-access` | permit |
//! | 0 | `default-deny` | forbid |

pub mod agent;
pub mod billing;
pub mod identity;
pub mod org;
pub mod security;
pub mod workspace;

use super::rule::Policy;

/// Priority of the security guard. No other policy may reach it.
pub const SECURITY_GUARD_PRIORITY: i32 = 1000;

/// Priority of the catch-all deny. No other policy may go as low.
pub const DEFAULT_DENY_PRIORITY: i32 = 0;

/// Ids of the built-in policies.
pub mod ids {
	pub const SECURITY_GUARD: &str = "security-guard";
	pub const ANONYMOUS_PUBLIC_ONLY: &str = "anonymous-public-only";
	pub const USER_OWN_PROFILE: &str = "user-own-profile";
	pub const USER_LIST_MEMBERSHIPS: &str = "user-list-memberships";
	pub const AGENT_LIST_QUERY: &str = "agent-list-query";
	pub const ORG_ADMIN_INVITE: &str = "org-admin-invite";
	pub const ORG_OWNER_MANAGE: &str = "org-owner-manage";
	pub const ORG_MEMBER_VIEW: &str = "org-member-view";
	pub const USER_CREATE_ORG: &str = "user-create-org";
	pub const SESSION_MANAGEMENT: &str = "session-management";
	pub const FILE_MANAGEMENT: &str = "file-management";
	pub const BILLING_ACCESS: &str = "billing-access";
	pub const DEFAULT_DENY: &str = "default-deny";
}

/// Returns the built-in policies, highest priority first.
pub fn policies() -> Vec<Policy> {
	vec![
		security::test_principal_guard(),
		identity::anonymous_public_only(),
		identity::user_own_profile(),
		identity::user_list_memberships(),
		agent::agent_list_query(),
		org::org_admin_invite(),
		org::org_owner_manage(),
		org::org_member_view(),
		identity::user_create_org(),
		workspace::session_management(),
		workspace::file_management(),
		billing::billing_access(),
		security::default_deny(),
	]
}
