// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a partial `*Layer` (every field optional,
//! merged across sources) and a resolved config produced by `finalize`.

mod audit;
mod authz;
mod logging;

pub use audit::{
	AuditConfig, AuditConfigLayer, FileSinkConfig, FileSinkConfigLayer, QueueOverflowPolicy,
};
pub use authz::{AuthzConfig, AuthzConfigLayer, ENVIRONMENT_ENV_VAR};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
