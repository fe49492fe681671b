// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Expert Agent Platform authorization service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file,
//!   environment, command line)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`EXPERT_SERVER_*`)
//!
//! The deployment environment has no default and must be set explicitly.
//!
//! # Usage
//!
//! ```ignore
//! use expert_server_config::load_config;
//!
//! let config = load_config()?;
//! let engine = expert_server_authz::PolicyEngine::new(config.authz.environment);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, OverrideSource, Precedence, TomlSource,
	SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info, warn};

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub authz: AuthzConfig,
	pub audit: AuditConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`EXPERT_SERVER_*`)
/// 2. Config file (`/etc/expert/server.toml`, skipped when absent)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource)];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path. The file must exist.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let authz = layer.authz.unwrap_or_default().finalize()?;
	let audit = layer.audit.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&audit)?;

	info!(
		environment = %authz.environment,
		audit_enabled = audit.enabled,
		audit_queue_capacity = audit.queue_capacity,
		audit_file_sinks = audit.file_sinks.len(),
		log_level = %logging.level,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		authz,
		audit,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(audit: &AuditConfig) -> Result<(), ConfigError> {
	if audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be at least 1".to_string(),
		));
	}

	if audit.enabled {
		if !audit.include_permits && !audit.include_denials {
			warn!("audit is enabled but both permits and denials are filtered out");
		}
		if !audit.tracing_sink && audit.file_sinks.is_empty() {
			warn!("audit is enabled but no sinks are configured");
		}
	}

	Ok(())
}
