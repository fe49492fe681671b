// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit logging configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_QUEUE_CAPACITY: usize = 10000;

fn default_queue_capacity() -> usize {
	DEFAULT_QUEUE_CAPACITY
}

/// What the decision logger does when its queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	/// Discard the record being logged.
	#[default]
	DropNewest,
	/// Wait for space. Records that do not fit are held in an unbounded
	/// backlog and forwarded in order, so nothing is dropped.
	Block,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub enabled: Option<bool>,
	pub queue_capacity: Option<usize>,
	pub queue_overflow_policy: Option<QueueOverflowPolicy>,
	pub include_permits: Option<bool>,
	pub include_denials: Option<bool>,
	pub tracing_sink: Option<bool>,
	pub file_sinks: Option<Vec<FileSinkConfigLayer>>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.queue_overflow_policy.is_some() {
			self.queue_overflow_policy = other.queue_overflow_policy;
		}
		if other.include_permits.is_some() {
			self.include_permits = other.include_permits;
		}
		if other.include_denials.is_some() {
			self.include_denials = other.include_denials;
		}
		if other.tracing_sink.is_some() {
			self.tracing_sink = other.tracing_sink;
		}
		if other.file_sinks.is_some() {
			self.file_sinks = other.file_sinks;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		let file_sinks = self
			.file_sinks
			.map(|sinks| sinks.into_iter().filter_map(|s| s.finalize()).collect())
			.unwrap_or_default();

		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			queue_capacity: self.queue_capacity.unwrap_or_else(default_queue_capacity),
			queue_overflow_policy: self.queue_overflow_policy.unwrap_or_default(),
			include_permits: self.include_permits.unwrap_or(true),
			include_denials: self.include_denials.unwrap_or(true),
			tracing_sink: self.tracing_sink.unwrap_or(true),
			file_sinks,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	pub enabled: bool,
	pub queue_capacity: usize,
	pub queue_overflow_policy: QueueOverflowPolicy,
	pub include_permits: bool,
	pub include_denials: bool,
	/// Emit every record as a `tracing` event on the `audit` target.
	pub tracing_sink: bool,
	pub file_sinks: Vec<FileSinkConfig>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			queue_capacity: default_queue_capacity(),
			queue_overflow_policy: QueueOverflowPolicy::default(),
			include_permits: true,
			include_denials: true,
			tracing_sink: true,
			file_sinks: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfigLayer {
	pub name: Option<String>,
	pub path: Option<String>,
}

impl FileSinkConfigLayer {
	pub fn finalize(self) -> Option<FileSinkConfig> {
		let path = self.path?;

		Some(FileSinkConfig {
			name: self.name.unwrap_or_else(|| "file".to_string()),
			path,
		})
	}
}

/// JSON-lines file sink. `path` may contain `%Y`, `%m` and `%d`, expanded
/// per record to rotate daily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfig {
	pub name: String,
	pub path: String,
}
