// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for policy registration and predicate evaluation.
//!
//! A denied request is never an error: it is an
//! [`AuthorizationDecision`](crate::AuthorizationDecision) with
//! `is_authorized == false`. These errors cover building the policy set and
//! faults raised by custom predicates.

use thiserror::Error;

pub type AuthzResult<T> = Result<T, AuthzError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
	#[error("policy id must not be empty")]
	InvalidPolicyId,

	#[error("duplicate policy id '{0}'")]
	DuplicatePolicyId(String),

	#[error(
		"policy '{id}' has priority {priority}; registered policies must be strictly between {min} and {max}"
	)]
	ReservedPriority {
		id: String,
		priority: i32,
		min: i32,
		max: i32,
	},

	#[error("invalid request: {0}")]
	InvalidRequest(String),
}

/// Fault raised by a custom policy predicate.
///
/// The engine treats a faulted predicate as "does not match".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
	#[error("missing attribute '{0}'")]
	MissingAttribute(String),

	#[error("predicate failed: {0}")]
	Failed(String),

	#[error("predicate panicked: {0}")]
	Panicked(String),
}
