// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization engine configuration section.

use expert_server_authz::Environment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that names the deployment environment.
pub const ENVIRONMENT_ENV_VAR: &str = "EXPERT_SERVER_ENV";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthzConfigLayer {
	/// Kept as a string so aliases (`dev`, `prod`) parse the same way from
	/// TOML and from the environment.
	pub environment: Option<String>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.environment.is_some() {
			self.environment = other.environment;
		}
	}

	/// The environment has no default: guessing wrong would silently disarm
	/// the production test-principal guard.
	pub fn finalize(self) -> Result<AuthzConfig, ConfigError> {
		let raw = self.environment.ok_or_else(|| ConfigError::Missing {
			key: "authz.environment".to_string(),
			hint: format!("set {ENVIRONMENT_ENV_VAR} or [authz] environment"),
		})?;

		let environment = raw
			.parse::<Environment>()
			.map_err(|e| ConfigError::InvalidValue {
				key: "authz.environment".to_string(),
				message: e.to_string(),
			})?;

		Ok(AuthzConfig { environment })
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthzConfig {
	pub environment: Environment,
}
