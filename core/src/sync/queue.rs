//! Upload queue processor
//!
//! Drains `queued` receipts strictly sequentially, oldest capture first.
//! Per-receipt outcomes land in the receipt's own state; only store
//! failures abort a pass.

use super::{SyncError, SyncManager};
use crate::cloud::api::{ApiError, CreateReceiptRequest, CreatedReceipt, ReceiptPageUpload};
use crate::cloud::UploadError;
use crate::domain::{Page, Receipt, SyncStatus};
use crate::infrastructure::blob::BlobError;
use crate::infrastructure::database::StoreError;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why one receipt's upload stopped. Store failures are engine problems and
/// re-raised; everything else becomes receipt state.
#[derive(Debug, thiserror::Error)]
enum UploadFailure {
	#[error("{0}")]
	Api(#[from] ApiError),
	#[error("{0}")]
	Transport(#[from] UploadError),
	#[error("could not read local page blob: {0}")]
	Blob(#[from] BlobError),
	#[error(transparent)]
	Store(StoreError),
}

impl SyncManager {
	/// Drain the upload queue. No-op while offline or while another pass is
	/// already running (single-flight); connectivity is re-checked between
	/// receipts and a loss stops the remaining batch, never the receipt in
	/// progress.
	pub async fn process_queue(&self) -> Result<(), SyncError> {
		if !self.is_connected() {
			debug!("skipping queue pass, no connectivity");
			return Ok(());
		}
		if self
			.queue_running
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			debug!("queue pass already running");
			return Ok(());
		}

		let result = self.drain_queue().await;
		self.queue_running.store(false, Ordering::SeqCst);
		result
	}

	async fn drain_queue(&self) -> Result<(), SyncError> {
		let batch = self.store.queued_receipts().await?;
		if batch.is_empty() {
			return Ok(());
		}
		info!(count = batch.len(), "processing upload queue");

		for receipt in batch {
			if !self.is_connected() {
				info!("connectivity lost, stopping queue pass");
				break;
			}
			self.upload_receipt(receipt).await?;
		}

		Ok(())
	}

	async fn upload_receipt(&self, receipt: Receipt) -> Result<(), SyncError> {
		// Durability before work: a crash from here on leaves an
		// `uploading` row for startup recovery to reclaim.
		self.store.mark_uploading(receipt.id).await?;
		let pages = self.store.pages_of(receipt.id).await?;

		match self.push_receipt(&receipt, &pages).await {
			Ok(created) => {
				self.store.mark_uploaded(receipt.id, &created.id).await?;
				info!(receipt_id = %receipt.id, remote_id = %created.id, "receipt uploaded");
			}
			Err(UploadFailure::Store(e)) => return Err(e.into()),
			Err(UploadFailure::Api(ApiError::Unauthorized)) => {
				// Signed out, not broken: hold the receipt in the queue
				// without surfacing a failure; the next successful sign-in
				// resumes it.
				self.store.requeue(receipt.id).await?;
				info!(receipt_id = %receipt.id, "upload requeued, authentication required");
			}
			Err(failure) => {
				self.store.mark_failed(receipt.id, &failure.to_string()).await?;
				warn!(receipt_id = %receipt.id, "upload failed: {failure}");
			}
		}

		Ok(())
	}

	/// Upload every page, then register the receipt. Stops at the first
	/// failing page; pages uploaded before the failure keep their remote
	/// path even though the receipt is not registered, so a later retry
	/// re-uploads them to fresh destinations.
	async fn push_receipt(
		&self,
		receipt: &Receipt,
		pages: &[Page],
	) -> Result<CreatedReceipt, UploadFailure> {
		let mut uploaded = Vec::with_capacity(pages.len());

		for page in pages {
			let bytes = self.blobs.read_page(receipt.id, &page.file_name).await?;
			let file_size = bytes.len() as i64;

			let destination = self
				.api
				.get_upload_destination(
					&receipt.account_id,
					&page.file_name,
					page.kind.mime_type(),
					file_size,
				)
				.await?;

			self.uploads
				.put(bytes, &destination, page.kind.mime_type())
				.await?;

			self.store
				.set_page_remote_path(page.id, &destination.remote_path)
				.await
				.map_err(UploadFailure::Store)?;

			debug!(receipt_id = %receipt.id, page = page.sort_order, "page uploaded");

			uploaded.push(ReceiptPageUpload {
				remote_path: destination.remote_path,
				file_name: page.file_name.clone(),
				file_size,
				sort_order: page.sort_order,
			});
		}

		Ok(self
			.api
			.create_receipt(&CreateReceiptRequest {
				account_id: receipt.account_id.clone(),
				note: receipt.note.clone(),
				trip_id: receipt.trip.as_ref().map(|t| t.id.clone()),
				pages: uploaded,
			})
			.await?)
	}

	/// Force one receipt back into the queue and drain it right away.
	pub async fn retry_receipt(&self, id: Uuid) -> Result<(), SyncError> {
		self.store.requeue(id).await?;
		self.process_queue().await
	}

	/// Requeue every failed receipt in one go, then drain.
	pub async fn retry_all_failed(&self) -> Result<(), SyncError> {
		let count = self.store.requeue_failed().await?;
		if count > 0 {
			info!(count, "requeued failed receipts");
		}
		self.process_queue().await
	}

	/// Startup recovery: reclaim `uploading` rows left behind by a crash.
	/// Must run before the first queue pass; `uploading` is unreachable by
	/// any selection afterwards, so a stale row would be stranded forever.
	pub async fn reset_stuck_uploads(&self) -> Result<u64, SyncError> {
		let count = self.store.reset_stuck_uploads().await?;
		if count > 0 {
			info!(count, "reset stuck uploads back to {}", SyncStatus::Queued);
		}
		Ok(count)
	}
}
