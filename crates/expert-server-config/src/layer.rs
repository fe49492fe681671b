// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{AuditConfigLayer, AuthzConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Sections a source does not set
/// stay `None` and leave lower-precedence values alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	pub authz: Option<AuthzConfigLayer>,
	pub audit: Option<AuditConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Overlays `other` on top of `self`, field by field.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.authz, other.authz, AuthzConfigLayer::merge);
		merge_section(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::LogFormat;

	#[test]
	fn test_merge_keeps_unset_sections() {
		let mut base = ServerConfigLayer {
			authz: Some(AuthzConfigLayer {
				environment: Some("beta".to_string()),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
				format: None,
			}),
			..Default::default()
		});

		assert_eq!(
			base.authz.and_then(|a| a.environment).as_deref(),
			Some("beta")
		);
		assert_eq!(
			base.logging.and_then(|l| l.level).as_deref(),
			Some("debug")
		);
		assert!(base.audit.is_none());
	}

	#[test]
	fn test_merge_is_field_level() {
		let mut base = ServerConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("warn".to_string()),
				format: Some(LogFormat::Json),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("trace".to_string()),
				format: None,
			}),
			..Default::default()
		});

		let logging = base.logging.unwrap();
		assert_eq!(logging.level.as_deref(), Some("trace"));
		assert_eq!(logging.format, Some(LogFormat::Json));
	}

	#[test]
	fn test_parses_from_toml() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[authz]
			environment = "prod"

			[audit]
			queue_capacity = 256
			include_permits = false

			[[audit.file_sinks]]
			path = "/var/log/expert/decisions-%Y%m%d.jsonl"

			[logging]
			format = "json"
			"#,
		)
		.unwrap();

		assert_eq!(
			layer.authz.unwrap().environment.as_deref(),
			Some("prod")
		);
		let audit = layer.audit.unwrap();
		assert_eq!(audit.queue_capacity, Some(256));
		assert_eq!(audit.file_sinks.map(|s| s.len()), Some(1));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}
}
