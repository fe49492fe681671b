// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use expert_server_config::{AuditConfig, QueueOverflowPolicy};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuditError, AuditResult};
use crate::filter::DecisionFilter;
use crate::record::DecisionRecord;
use crate::sink::DecisionSink;

/// Asynchronous decision logger.
///
/// `log` pushes onto a bounded queue and returns immediately; a background
/// task applies the filter and hands each record to every sink in turn. The
/// caller's request path never waits on a sink and never sees a sink error.
///
/// Records passed to `log` reach the sinks in call order under either
/// overflow policy.
pub struct DecisionLogger {
	tx: Option<mpsc::Sender<Arc<DecisionRecord>>>,
	/// Present under `Block`: a FIFO in front of the bounded queue, drained by
	/// a single forwarding task.
	backlog: Option<mpsc::UnboundedSender<Arc<DecisionRecord>>>,
	overflow_policy: QueueOverflowPolicy,
	dropped: AtomicU64,
	worker: Option<JoinHandle<()>>,
	forwarder: Option<JoinHandle<()>>,
}

impl DecisionLogger {
	/// Starts the background task. Must be called from within a Tokio runtime.
	pub fn new(
		filter: DecisionFilter,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn DecisionSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		let worker = tokio::spawn(Self::background_task(rx, filter, sinks));

		let (backlog, forwarder) = match overflow_policy {
			QueueOverflowPolicy::Block => {
				let (backlog_tx, backlog_rx) = mpsc::unbounded_channel();
				let forwarder = tokio::spawn(Self::forward_task(backlog_rx, tx.clone()));
				(Some(backlog_tx), Some(forwarder))
			}
			QueueOverflowPolicy::DropNewest => (None, None),
		};

		Self {
			tx: Some(tx),
			backlog,
			overflow_policy,
			dropped: AtomicU64::new(0),
			worker: Some(worker),
			forwarder,
		}
	}

	/// A logger that accepts and discards everything.
	pub fn disabled() -> Self {
		Self {
			tx: None,
			backlog: None,
			overflow_policy: QueueOverflowPolicy::DropNewest,
			dropped: AtomicU64::new(0),
			worker: None,
			forwarder: None,
		}
	}

	/// Builds the logger and sinks described by `config`.
	pub fn from_config(config: &AuditConfig) -> AuditResult<Self> {
		if !config.enabled {
			info!("decision audit logging disabled");
			return Ok(Self::disabled());
		}
		if config.queue_capacity == 0 {
			return Err(AuditError::ConfigError(
				"queue_capacity must be at least 1".to_string(),
			));
		}

		let mut sinks: Vec<Arc<dyn DecisionSink>> = Vec::new();

		if config.tracing_sink {
			#[cfg(feature = "sink-tracing")]
			sinks.push(Arc::new(crate::sink::tracing::TracingDecisionSink::new()));
			#[cfg(not(feature = "sink-tracing"))]
			warn!("tracing sink requested but the sink-tracing feature is disabled");
		}

		for file_sink in &config.file_sinks {
			#[cfg(feature = "sink-file")]
			sinks.push(Arc::new(crate::sink::file::FileDecisionSink::new(
				file_sink.clone(),
			)));
			#[cfg(not(feature = "sink-file"))]
			warn!(
				sink = %file_sink.name,
				"file sink requested but the sink-file feature is disabled"
			);
		}

		info!(
			sinks = sinks.len(),
			queue_capacity = config.queue_capacity,
			include_permits = config.include_permits,
			include_denials = config.include_denials,
			"decision audit logging enabled"
		);

		Ok(Self::new(
			DecisionFilter::from(config),
			config.queue_capacity,
			config.queue_overflow_policy,
			sinks,
		))
	}

	pub fn is_enabled(&self) -> bool {
		self.tx.is_some()
	}

	/// Records dropped because the queue was full or closed.
	pub fn dropped_count(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	async fn background_task(
		mut rx: mpsc::Receiver<Arc<DecisionRecord>>,
		filter: DecisionFilter,
		sinks: Vec<Arc<dyn DecisionSink>>,
	) {
		while let Some(record) = rx.recv().await {
			if !filter.allows(&record) {
				continue;
			}

			for sink in &sinks {
				if let Err(e) = sink.publish(Arc::clone(&record)).await {
					warn!(
						sink = sink.name(),
						decision_id = %record.id,
						error = %e,
						"decision sink publish failed"
					);
				}
			}
		}
		debug!("decision logger queue closed");
	}

	/// Moves backlog records onto the bounded queue one at a time, waiting
	/// for space, so they arrive in the order they were logged.
	async fn forward_task(
		mut backlog: mpsc::UnboundedReceiver<Arc<DecisionRecord>>,
		tx: mpsc::Sender<Arc<DecisionRecord>>,
	) {
		while let Some(record) = backlog.recv().await {
			if tx.send(record).await.is_err() {
				debug!("decision logger closed while forwarding backlog");
				return;
			}
		}
	}

	/// Queues a record for the sinks.
	///
	/// Returns `true` if the record was queued (or the logger is disabled),
	/// `false` if it was dropped.
	///
	/// # Overflow Policy Behavior
	///
	/// - `DropNewest`: uses `try_send`; the record is dropped when the queue is full
	/// - `Block`: appends to an unbounded backlog that a single task forwards
	///   into the queue, waiting for space; nothing is dropped while the
	///   logger is running, and memory grows with the backlog
	#[instrument(skip(self, record), fields(decision = %record.decision, action = %record.action))]
	pub fn log(&self, record: DecisionRecord) -> bool {
		let Some(tx) = &self.tx else {
			return true;
		};
		let record = Arc::new(record);

		if let Some(backlog) = &self.backlog {
			if backlog.send(record).is_err() {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				warn!(reason = "backlog closed", "dropped decision record");
				return false;
			}
			return true;
		}

		match tx.try_send(record) {
			Ok(()) => true,
			Err(e) => {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				let reason = match e {
					mpsc::error::TrySendError::Full(_) => "queue full",
					mpsc::error::TrySendError::Closed(_) => "queue closed",
				};
				warn!(reason, "dropped decision record");
				false
			}
		}
	}

	/// Queues a record, waiting for space if necessary.
	///
	/// This bypasses the `Block` backlog, so it is not ordered relative to
	/// records still waiting there.
	pub async fn log_async(&self, record: DecisionRecord) -> AuditResult<()> {
		let Some(tx) = &self.tx else {
			return Ok(());
		};
		tx.send(Arc::new(record)).await.map_err(|_| AuditError::Shutdown)
	}

	/// Closes the queue and waits until every queued record has been handed
	/// to the sinks.
	pub async fn shutdown(mut self) {
		self.backlog.take();
		if let Some(forwarder) = self.forwarder.take() {
			if let Err(e) = forwarder.await {
				warn!(error = %e, "decision backlog task failed");
			}
		}
		self.tx.take();
		if let Some(worker) = self.worker.take() {
			if let Err(e) = worker.await {
				warn!(error = %e, "decision logger task failed");
			}
		}
	}
}

impl std::fmt::Debug for DecisionLogger {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DecisionLogger")
			.field("enabled", &self.is_enabled())
			.field("overflow_policy", &self.overflow_policy)
			.field("dropped", &self.dropped_count())
			.finish()
	}
}
