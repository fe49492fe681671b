// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use expert_server_config::FileSinkConfig;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AuditSinkError;
use crate::record::DecisionRecord;
use crate::sink::DecisionSink;

struct FileHandle {
	path: String,
	file: tokio::fs::File,
}

/// Appends records as JSON lines. The path is re-expanded for every record,
/// so a `%Y%m%d` pattern rotates to a new file at midnight UTC.
pub struct FileDecisionSink {
	config: FileSinkConfig,
	handle: Mutex<Option<FileHandle>>,
}

impl FileDecisionSink {
	pub fn new(config: FileSinkConfig) -> Self {
		Self {
			config,
			handle: Mutex::new(None),
		}
	}

	async fn write_line(&self, expanded_path: &str, line: &str) -> Result<(), AuditSinkError> {
		let mut guard = self.handle.lock().await;

		let needs_reopen = match &*guard {
			Some(handle) => handle.path != expanded_path,
			None => true,
		};

		if needs_reopen {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(expanded_path)
				.await
				.map_err(|e| AuditSinkError::Transient(format!("failed to open file: {e}")))?;

			*guard = Some(FileHandle {
				path: expanded_path.to_string(),
				file,
			});
		}

		let handle = guard
			.as_mut()
			.ok_or_else(|| AuditSinkError::Permanent("file handle not initialized".to_string()))?;

		handle
			.file
			.write_all(line.as_bytes())
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to write to file: {e}")))?;

		handle
			.file
			.flush()
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to flush file: {e}")))?;

		Ok(())
	}
}

#[async_trait]
impl DecisionSink for FileDecisionSink {
	fn name(&self) -> &str {
		&self.config.name
	}

	async fn publish(&self, record: Arc<DecisionRecord>) -> Result<(), AuditSinkError> {
		let expanded_path = expand_path(&self.config.path, record.timestamp);
		let line = format_json_line(&record)?;
		self.write_line(&expanded_path, &line).await
	}
}

pub fn format_json_line(record: &DecisionRecord) -> Result<String, AuditSinkError> {
	let json = serde_json::to_string(record)
		.map_err(|e| AuditSinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}

/// Expands `%Y`, `%m` and `%d` using the record's timestamp.
pub fn expand_path(path: &str, at: DateTime<Utc>) -> String {
	path
		.replace("%Y", &format!("{:04}", at.year()))
		.replace("%m", &format!("{:02}", at.month()))
		.replace("%d", &format!("{:02}", at.day()))
}
