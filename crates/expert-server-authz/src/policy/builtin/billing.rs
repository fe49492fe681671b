// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Billing and usage policies.

use super::ids;
use crate::policy::rule::{Condition, OrgScope, Policy, PrincipalSelector};
use crate::types::{Action, OrgRole};

/// Any member may view billing and usage; managing billing requires the
/// owner or billing_manager role.
///
/// The org is the resource id for `Org` resources and the `org_id` attribute
/// for anything else (reports, invoices).
pub fn billing_access() -> Policy {
	Policy::permit(ids::BILLING_ACCESS, 300)
		.describe("Billing access follows org role")
		.principals(PrincipalSelector::Authenticated)
		.actions([Action::ViewBilling, Action::ViewUsage, Action::ManageBilling])
		.when(Condition::any([
			Condition::all([
				Condition::action_in([Action::ViewBilling, Action::ViewUsage]),
				Condition::HasAnyOrgRole {
					scope: OrgScope::Owning,
				},
			]),
			Condition::all([
				Condition::action_in([Action::ManageBilling]),
				Condition::has_org_role(
					OrgScope::Owning,
					[OrgRole::Owner, OrgRole::BillingManager],
				),
			]),
		]))
}
