// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use expert_server_config::AuditConfig;

use crate::record::{DecisionOutcome, DecisionRecord};

/// Selects which decisions reach the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionFilter {
	pub include_permits: bool,
	pub include_denials: bool,
}

impl Default for DecisionFilter {
	fn default() -> Self {
		Self {
			include_permits: true,
			include_denials: true,
		}
	}
}

impl DecisionFilter {
	/// Only denials; the usual setting for high-traffic deployments.
	pub fn denials_only() -> Self {
		Self {
			include_permits: false,
			include_denials: true,
		}
	}

	pub fn allows(&self, record: &DecisionRecord) -> bool {
		match record.decision {
			DecisionOutcome::Permit => self.include_permits,
			DecisionOutcome::Deny => self.include_denials,
		}
	}
}

impl From<&AuditConfig> for DecisionFilter {
	fn from(config: &AuditConfig) -> Self {
		Self {
			include_permits: config.include_permits,
			include_denials: config.include_denials,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn record(outcome: DecisionOutcome) -> DecisionRecord {
		DecisionRecord::builder(outcome).build()
	}

	#[test]
	fn default_allows_everything() {
		let filter = DecisionFilter::default();
		assert!(filter.allows(&record(DecisionOutcome::Permit)));
		assert!(filter.allows(&record(DecisionOutcome::Deny)));
	}

	#[test]
	fn denials_only_drops_permits() {
		let filter = DecisionFilter::denials_only();
		assert!(!filter.allows(&record(DecisionOutcome::Permit)));
		assert!(filter.allows(&record(DecisionOutcome::Deny)));
	}

	#[test]
	fn built_from_config() {
		let config = AuditConfig {
			include_denials: false,
			..Default::default()
		};
		let filter = DecisionFilter::from(&config);
		assert!(filter.include_permits);
		assert!(!filter.include_denials);
	}

	proptest! {
		#[test]
		fn allows_matches_flags(include_permits: bool, include_denials: bool, permit: bool) {
			let filter = DecisionFilter { include_permits, include_denials };
			let expected = if permit { include_permits } else { include_denials };
			prop_assert_eq!(filter.allows(&record(permit.into())), expected);
		}
	}
}
