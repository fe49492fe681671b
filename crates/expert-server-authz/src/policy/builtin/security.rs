// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boundary policies: the test-principal guard and the catch-all deny.

use super::{ids, DEFAULT_DENY_PRIORITY, SECURITY_GUARD_PRIORITY};
use crate::policy::rule::{Condition, Policy};

/// Forbids test identities in production, ahead of every other rule.
///
/// Holds even if whatever injects test principals upstream is compromised.
pub fn test_principal_guard() -> Policy {
	Policy::forbid(ids::SECURITY_GUARD, SECURITY_GUARD_PRIORITY)
		.describe("Test principals are not allowed in production")
		.when(Condition::TestPrincipalInProduction)
}

/// Matches everything. Guarantees every request gets a decision.
pub fn default_deny() -> Policy {
	Policy::forbid(ids::DEFAULT_DENY, DEFAULT_DENY_PRIORITY)
		.describe("No policy permits this request")
		.when(Condition::Always)
}
