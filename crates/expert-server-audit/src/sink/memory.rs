// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::record::DecisionRecord;
use crate::sink::DecisionSink;

/// Keeps the most recent records in memory, evicting the oldest beyond
/// `capacity`. Used for inspection and in tests.
#[derive(Debug)]
pub struct MemoryDecisionSink {
	capacity: usize,
	records: Mutex<VecDeque<Arc<DecisionRecord>>>,
}

impl MemoryDecisionSink {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			records: Mutex::new(VecDeque::new()),
		}
	}

	fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<DecisionRecord>>> {
		self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Records currently held, oldest first.
	pub fn records(&self) -> Vec<Arc<DecisionRecord>> {
		self.lock().iter().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	pub fn clear(&self) {
		self.lock().clear();
	}
}

#[async_trait]
impl DecisionSink for MemoryDecisionSink {
	fn name(&self) -> &str {
		"memory"
	}

	async fn publish(&self, record: Arc<DecisionRecord>) -> Result<(), AuditSinkError> {
		let mut records = self.lock();
		if records.len() == self.capacity {
			records.pop_front();
		}
		records.push_back(record);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::DecisionOutcome;

	fn record(action: &str) -> Arc<DecisionRecord> {
		Arc::new(DecisionRecord::builder(DecisionOutcome::Deny).action(action).build())
	}

	#[tokio::test]
	async fn keeps_records_in_order() {
		let sink = MemoryDecisionSink::new(10);
		sink.publish(record("A")).await.unwrap();
		sink.publish(record("B")).await.unwrap();

		let actions: Vec<_> = sink.records().iter().map(|r| r.action.clone()).collect();
		assert_eq!(actions, vec!["A", "B"]);
	}

	#[tokio::test]
	async fn evicts_oldest_beyond_capacity() {
		let sink = MemoryDecisionSink::new(2);
		for action in ["A", "B", "C"] {
			sink.publish(record(action)).await.unwrap();
		}

		let actions: Vec<_> = sink.records().iter().map(|r| r.action.clone()).collect();
		assert_eq!(actions, vec!["B", "C"]);
	}

	#[tokio::test]
	async fn clear_empties_the_sink() {
		let sink = MemoryDecisionSink::new(2);
		sink.publish(record("A")).await.unwrap();
		sink.clear();
		assert!(sink.is_empty());
	}
}
