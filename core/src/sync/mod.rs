//! Offline-first sync engine
//!
//! Owns the upload queue, the review-status reconciler, the retention
//! sweeper and the record-level delete/update flows. All engine state that
//! used to be ambient (queue-running flag, connectivity) is explicit on
//! [`SyncManager`]; collaborators come in through the `cloud` traits.

use crate::cloud::{ApiError, ReceiptsApi, UploadError, UploadTransport};
use crate::config::EngineConfig;
use crate::infrastructure::blob::{BlobError, BlobStorage};
use crate::infrastructure::database::{ReceiptStore, StoreError};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

mod queue;
mod records;
mod retention;
mod status;

#[cfg(test)]
mod tests;

pub use crate::infrastructure::database::store::QueueOverview;

/// Must-propagate engine error: anything that could strand local and remote
/// state in disagreement (delete, update, create) aborts with one of these
/// instead of partially applying. Convergent paths (status polling, queue
/// draining, retention) absorb their failures via [`best_effort`] instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Api(#[from] ApiError),
	#[error(transparent)]
	Upload(#[from] UploadError),
	#[error(transparent)]
	Blob(#[from] BlobError),
	#[error("receipt {0} not found")]
	ReceiptNotFound(Uuid),
}

/// Engine knobs lifted out of [`EngineConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
	/// Remote ids per status-check request.
	pub status_batch_size: usize,
	/// Days a terminal receipt keeps its local blobs.
	pub retention_days: u32,
}

impl Default for SyncSettings {
	fn default() -> Self {
		Self {
			status_batch_size: 25,
			retention_days: 90,
		}
	}
}

impl From<&EngineConfig> for SyncSettings {
	fn from(config: &EngineConfig) -> Self {
		Self {
			status_batch_size: config.status_batch_size.max(1),
			retention_days: config.retention_days,
		}
	}
}

/// The engine facade the shell apps hold on to.
pub struct SyncManager {
	store: Arc<ReceiptStore>,
	blobs: Arc<BlobStorage>,
	api: Arc<dyn ReceiptsApi>,
	uploads: Arc<dyn UploadTransport>,
	settings: SyncSettings,

	/// Ambient connectivity as last reported by the platform monitor.
	connected: AtomicBool,
	/// Single-flight guard: at most one queue pass runs at a time.
	queue_running: AtomicBool,
}

impl SyncManager {
	/// Engines start out assuming no connectivity; the platform monitor
	/// reports the real state through [`Self::handle_network_change`].
	pub fn new(
		store: Arc<ReceiptStore>,
		blobs: Arc<BlobStorage>,
		api: Arc<dyn ReceiptsApi>,
		uploads: Arc<dyn UploadTransport>,
		settings: SyncSettings,
	) -> Self {
		Self {
			store,
			blobs,
			api,
			uploads,
			settings,
			connected: AtomicBool::new(false),
			queue_running: AtomicBool::new(false),
		}
	}

	pub fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	/// Connectivity trigger. The engine is otherwise purely reactive: a
	/// transition to connected drains the queue, nothing polls on a timer.
	pub async fn handle_network_change(&self, is_connected: bool) {
		let was_connected = self.connected.swap(is_connected, Ordering::SeqCst);
		if is_connected && !was_connected {
			info!("connectivity restored, draining upload queue");
			if let Err(e) = self.process_queue().await {
				error!("queue pass after reconnect failed: {e}");
			}
		}
	}

	/// Per-status counts for UI badges.
	pub async fn queue_overview(&self) -> Result<QueueOverview, SyncError> {
		Ok(self.store.queue_overview().await?)
	}
}

/// Absorb a failure on a convergent path: log it, drop it, rely on the next
/// periodic invocation. Returning `Option` instead of `Result` keeps these
/// call sites visibly distinct from the must-propagate ones.
pub(crate) fn best_effort<T, E: Display>(context: &str, result: Result<T, E>) -> Option<T> {
	match result {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("{context} failed, will retry on a later cycle: {e}");
			None
		}
	}
}
