//! Capture/import seam
//!
//! The camera and file-import flows hand their page bytes to this
//! operation, which lays out the blobs and persists the receipt in
//! `queued` state. It is the only write path that creates receipts, which
//! keeps blob layout and page numbering consistent.

use crate::domain::{EnhancementMode, Page, PageKind, Receipt, SyncStatus, TripRef};
use crate::infrastructure::blob::BlobStorage;
use crate::infrastructure::database::{ReceiptStore, StoreError};
use crate::sync::SyncError;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

/// Bytes of one page to import, in presentation order.
pub struct NewPage {
	pub bytes: Vec<u8>,
	pub thumbnail: Option<Vec<u8>>,
	pub kind: PageKind,
}

pub struct ImportRequest {
	pub account_id: String,
	pub note: Option<String>,
	pub trip: Option<TripRef>,
	pub enhancement: EnhancementMode,
	pub captured_at: DateTime<Utc>,
	pub pages: Vec<NewPage>,
}

/// Persist a newly captured/imported receipt: blobs first, then the rows in
/// one transaction. If the row insert fails the blob directory is removed
/// again so no orphaned files stay behind.
pub async fn import_receipt(
	store: &ReceiptStore,
	blobs: &BlobStorage,
	request: ImportRequest,
) -> Result<Receipt, SyncError> {
	if request.pages.is_empty() {
		return Err(StoreError::EmptyReceipt.into());
	}

	let receipt_id = Uuid::new_v4();
	let mut pages = Vec::with_capacity(request.pages.len());

	for (index, new_page) in request.pages.iter().enumerate() {
		let sort_order = index as i32 + 1;
		let file_name = BlobStorage::page_file_name(sort_order, new_page.kind);
		blobs
			.write_page(
				receipt_id,
				&file_name,
				&new_page.bytes,
				new_page.thumbnail.as_deref(),
			)
			.await?;

		pages.push(Page {
			id: Uuid::new_v4(),
			receipt_id,
			sort_order,
			file_name,
			file_size: new_page.bytes.len() as i64,
			kind: new_page.kind,
			remote_path: None,
		});
	}

	let receipt = Receipt {
		id: receipt_id,
		account_id: request.account_id,
		note: request.note,
		trip: request.trip,
		captured_at: request.captured_at,
		enhancement: request.enhancement,
		sync_status: SyncStatus::Queued,
		last_sync_error: None,
		server_receipt_id: None,
		server_status: None,
		server_status_changed_at: None,
		rejection_reason: None,
		expense_id: None,
		images_cleaned_up: false,
		updated_at: Utc::now(),
	};

	if let Err(e) = store.insert_receipt(&receipt, &pages).await {
		let _ = blobs.remove_receipt_dir(receipt_id).await;
		return Err(e.into());
	}

	info!(receipt_id = %receipt_id, pages = pages.len(), "receipt imported");
	Ok(receipt)
}
