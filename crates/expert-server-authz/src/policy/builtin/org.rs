// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization access policies.
//!
//! All three are scoped to the org named by the resource id, so a role in one
//! org never grants anything in another.

use super::ids;
use crate::policy::rule::{Condition, OrgScope, Policy, PrincipalSelector};
use crate::types::{Action, OrgRole, ResourceKind};

/// Owners and admins may invite members.
pub fn org_admin_invite() -> Policy {
	Policy::permit(ids::ORG_ADMIN_INVITE, 600)
		.describe("Org owners and admins can invite members")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::InviteMember])
		.on(ResourceKind::Org)
		.when(Condition::has_org_role(
			OrgScope::ResourceId,
			[OrgRole::Owner, OrgRole::Admin],
		))
}

/// Owners may manage everything; admins everything except deleting the org.
pub fn org_owner_manage() -> Policy {
	Policy::permit(ids::ORG_OWNER_MANAGE, 590)
		.describe("Org management is limited to owners, and to admins short of deletion")
		.principals(PrincipalSelector::Authenticated)
		.actions([
			Action::UpdateOrg,
			Action::DeleteOrg,
			Action::ConfigureSso,
			Action::VerifyDomain,
			Action::RemoveMember,
			Action::UpdateMemberRole,
		])
		.on(ResourceKind::Org)
		.when(Condition::any([
			Condition::has_org_role(OrgScope::ResourceId, [OrgRole::Owner]),
			Condition::all([
				Condition::has_org_role(OrgScope::ResourceId, [OrgRole::Admin]),
				Condition::not(Condition::action_in([Action::DeleteOrg])),
			]),
		]))
}

/// Any member may view the org.
pub fn org_member_view() -> Policy {
	Policy::permit(ids::ORG_MEMBER_VIEW, 580)
		.describe("Org members can view the organization")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::GetOrg])
		.on(ResourceKind::Org)
		.when(Condition::HasAnyOrgRole {
			scope: OrgScope::ResourceId,
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::model::{AuthorizationRequest, Principal, Resource};
	use crate::policy::rule::EvaluationEnv;
	use crate::types::Environment;

	fn matches(policy: &Policy, principal: Principal, action: Action, resource: Resource) -> bool {
		let env = EvaluationEnv {
			environment: Environment::Production,
		};
		policy
			.evaluate(&AuthorizationRequest::new(principal, action, resource), &env)
			.unwrap()
			.matches
	}

	fn with_role(role: OrgRole) -> Principal {
		Principal::user("user-1").with_membership("org1", role)
	}

	mod invite {
		use super::*;

		#[test]
		fn owner_and_admin_can_invite() {
			for role in [OrgRole::Owner, OrgRole::Admin] {
				assert!(matches(
					&org_admin_invite(),
					with_role(role),
					Action::InviteMember,
					Resource::org("org1"),
				));
			}
		}

		#[test]
		fn member_and_billing_manager_cannot_invite() {
			for role in [OrgRole::Member, OrgRole::BillingManager] {
				assert!(!matches(
					&org_admin_invite(),
					with_role(role),
					Action::InviteMember,
					Resource::org("org1"),
				));
			}
		}

		#[test]
		fn owner_cannot_invite_into_another_org() {
			assert!(!matches(
				&org_admin_invite(),
				with_role(OrgRole::Owner),
				Action::InviteMember,
				Resource::org("org2"),
			));
		}

		#[test]
		fn org_attribute_on_the_resource_is_ignored() {
			// The org is the resource itself; a forged org_id attribute must not count.
			assert!(!matches(
				&org_admin_invite(),
				with_role(OrgRole::Owner),
				Action::InviteMember,
				Resource::org("org2").with_org("org1"),
			));
		}
	}

	mod manage {
		use super::*;

		const MANAGE_ACTIONS: [Action; 6] = [
			Action::UpdateOrg,
			Action::DeleteOrg,
			Action::ConfigureSso,
			Action::VerifyDomain,
			Action::RemoveMember,
			Action::UpdateMemberRole,
		];

		#[test]
		fn owner_can_do_everything() {
			for action in MANAGE_ACTIONS {
				assert!(
					matches(&org_owner_manage(), with_role(OrgRole::Owner), action.clone(), Resource::org("org1")),
					"owner denied {action}"
				);
			}
		}

		#[test]
		fn admin_can_do_everything_but_delete() {
			for action in MANAGE_ACTIONS {
				let allowed = matches(
					&org_owner_manage(),
					with_role(OrgRole::Admin),
					action.clone(),
					Resource::org("org1"),
				);
				assert_eq!(allowed, action != Action::DeleteOrg, "admin and {action}");
			}
		}

		#[test]
		fn member_cannot_manage() {
			for action in MANAGE_ACTIONS {
				assert!(!matches(
					&org_owner_manage(),
					with_role(OrgRole::Member),
					action,
					Resource::org("org1"),
				));
			}
		}

		#[test]
		fn owner_cannot_manage_another_org() {
			assert!(!matches(
				&org_owner_manage(),
				with_role(OrgRole::Owner),
				Action::DeleteOrg,
				Resource::org("org2"),
			));
		}
	}

	mod view {
		use super::*;

		#[test]
		fn any_role_can_view() {
			for role in [
				OrgRole::Owner,
				OrgRole::Admin,
				OrgRole::BillingManager,
				OrgRole::Member,
				OrgRole::Other("viewer".into()),
			] {
				assert!(matches(
					&org_member_view(),
					with_role(role),
					Action::GetOrg,
					Resource::org("org1"),
				));
			}
		}

		#[test]
		fn non_member_cannot_view() {
			assert!(!matches(
				&org_member_view(),
				Principal::user("user-1"),
				Action::GetOrg,
				Resource::org("org1"),
			));
		}

		#[test]
		fn wildcard_org_is_not_viewable() {
			assert!(!matches(
				&org_member_view(),
				with_role(OrgRole::Owner),
				Action::GetOrg,
				Resource::wildcard(ResourceKind::Org),
			));
		}
	}
}
