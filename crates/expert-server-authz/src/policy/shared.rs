// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine handle that allows registration while requests are in flight.

use std::sync::{Arc, RwLock};

use super::decision::{AuthorizationDecision, Explanation};
use super::engine::PolicyEngine;
use super::model::AuthorizationRequest;
use super::rule::Policy;
use crate::error::AuthzResult;

/// A cloneable handle to the current [`PolicyEngine`].
///
/// Registration builds a new engine and swaps it in. A check in progress keeps
/// the snapshot it started with, so it sees either the old policy set or the
/// new one, never a partial list.
#[derive(Debug, Clone)]
pub struct SharedPolicyEngine {
	inner: Arc<RwLock<Arc<PolicyEngine>>>,
}

impl SharedPolicyEngine {
	pub fn new(engine: PolicyEngine) -> Self {
		Self {
			inner: Arc::new(RwLock::new(Arc::new(engine))),
		}
	}

	/// The engine as of now.
	pub fn snapshot(&self) -> Arc<PolicyEngine> {
		// The lock only guards an Arc swap; a poisoned lock still holds a valid engine.
		let guard = self
			.inner
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		Arc::clone(&guard)
	}

	pub fn is_authorized(&self, request: &AuthorizationRequest) -> AuthorizationDecision {
		self.snapshot().is_authorized(request)
	}

	pub fn explain(&self, request: &AuthorizationRequest) -> Explanation {
		self.snapshot().explain(request)
	}

	/// Registers a policy for all subsequent checks.
	pub fn add_policy(&self, policy: Policy) -> AuthzResult<()> {
		let mut guard = self
			.inner
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		let next = guard.with_policy(policy)?;
		*guard = Arc::new(next);
		Ok(())
	}
}

impl From<PolicyEngine> for SharedPolicyEngine {
	fn from(engine: PolicyEngine) -> Self {
		Self::new(engine)
	}
}
