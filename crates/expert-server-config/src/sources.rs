// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment variables and
//! command-line overrides.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, AuthzConfigLayer, FileSinkConfigLayer, LogFormat, LoggingConfigLayer,
	QueueOverflowPolicy, ENVIRONMENT_ENV_VAR,
};

/// Default location of the config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/expert/server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	CommandLine = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file the caller asked for explicitly; it must exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// The system-wide file, skipped when absent.
	pub fn system() -> Self {
		Self {
			path: PathBuf::from(SYSTEM_CONFIG_PATH),
			required: false,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: EXPERT_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl EnvSource {
	/// Builds a layer from an arbitrary variable lookup.
	pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<ServerConfigLayer, ConfigError> {
		let env = Env(&lookup);
		Ok(ServerConfigLayer {
			authz: Some(load_authz_from_env(&env)),
			audit: Some(load_audit_from_env(&env)?),
			logging: Some(load_logging_from_env(&env)?),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Self::load_from(|name| std::env::var(name).ok())
	}
}

/// A pre-built layer, typically from command-line flags.
pub struct OverrideSource {
	layer: ServerConfigLayer,
}

impl OverrideSource {
	pub fn new(layer: ServerConfigLayer) -> Self {
		Self { layer }
	}

	/// Overrides just the deployment environment.
	pub fn environment(environment: impl Into<String>) -> Self {
		Self::new(ServerConfigLayer {
			authz: Some(AuthzConfigLayer {
				environment: Some(environment.into()),
			}),
			..Default::default()
		})
	}
}

impl ConfigSource for OverrideSource {
	fn name(&self) -> &'static str {
		"command-line"
	}

	fn precedence(&self) -> Precedence {
		Precedence::CommandLine
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(self.layer.clone())
	}
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.var(name) {
			Some(v) => match v.to_ascii_lowercase().as_str() {
				"true" | "1" | "yes" => Ok(Some(true)),
				"false" | "0" | "no" => Ok(Some(false)),
				_ => Err(ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("invalid boolean value '{v}'"),
				}),
			},
			None => Ok(None),
		}
	}

	fn usize(&self, name: &str) -> Result<Option<usize>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid usize value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

fn load_authz_from_env(env: &Env<'_>) -> AuthzConfigLayer {
	AuthzConfigLayer {
		environment: env.var(ENVIRONMENT_ENV_VAR),
	}
}

fn load_audit_from_env(env: &Env<'_>) -> Result<AuditConfigLayer, ConfigError> {
	let queue_overflow_policy = match env.var("EXPERT_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY") {
		Some(v) => Some(match v.to_ascii_lowercase().as_str() {
			"drop_newest" => QueueOverflowPolicy::DropNewest,
			"block" => QueueOverflowPolicy::Block,
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "EXPERT_SERVER_AUDIT_QUEUE_OVERFLOW_POLICY".to_string(),
					message: format!("unknown policy '{v}' (expected drop_newest or block)"),
				})
			}
		}),
		None => None,
	};

	// A single file sink can be configured from the environment; use TOML for more.
	let file_sinks = env
		.var("EXPERT_SERVER_AUDIT_FILE_PATH")
		.map(|path| {
			vec![FileSinkConfigLayer {
				name: Some("file".to_string()),
				path: Some(path),
			}]
		});

	Ok(AuditConfigLayer {
		enabled: env.bool("EXPERT_SERVER_AUDIT_ENABLED")?,
		queue_capacity: env.usize("EXPERT_SERVER_AUDIT_QUEUE_CAPACITY")?,
		queue_overflow_policy,
		include_permits: env.bool("EXPERT_SERVER_AUDIT_INCLUDE_PERMITS")?,
		include_denials: env.bool("EXPERT_SERVER_AUDIT_INCLUDE_DENIALS")?,
		tracing_sink: env.bool("EXPERT_SERVER_AUDIT_TRACING_SINK")?,
		file_sinks,
	})
}

fn load_logging_from_env(env: &Env<'_>) -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env.var("EXPERT_SERVER_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
			key: "EXPERT_SERVER_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env.var("EXPERT_SERVER_LOG_LEVEL"),
		format,
	})
}
