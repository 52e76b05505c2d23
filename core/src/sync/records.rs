//! Record-level delete and metadata update
//!
//! Both flows are remote-first for remote receipts: the local side is only
//! touched once the service has confirmed, so the two sides can never
//! disagree about a delete or an edit.

use super::{SyncError, SyncManager};
use crate::cloud::api::UpdateReceiptRequest;
use crate::domain::TripRef;
use tracing::info;
use uuid::Uuid;

impl SyncManager {
	/// Delete a receipt. Remote receipts are deleted on the service first;
	/// if that call fails nothing local changes. Local blobs and rows then
	/// go together.
	pub async fn delete_receipt(&self, id: Uuid) -> Result<(), SyncError> {
		let receipt = self
			.store
			.receipt(id)
			.await?
			.ok_or(SyncError::ReceiptNotFound(id))?;

		if let Some(remote_id) = receipt.remote_id_if_uploaded() {
			self.api.delete_receipt(remote_id).await?;
		}

		self.blobs.remove_receipt_dir(id).await?;
		self.store.delete_receipt(id).await?;
		info!(receipt_id = %id, "receipt deleted");

		Ok(())
	}

	/// Update note/trip metadata. For remote receipts the service is asked
	/// first; a conflict (review already locked the record) propagates
	/// verbatim and local fields stay untouched - never silently dropped or
	/// partially applied.
	pub async fn update_receipt_metadata(
		&self,
		id: Uuid,
		note: Option<String>,
		trip: Option<TripRef>,
	) -> Result<(), SyncError> {
		let receipt = self
			.store
			.receipt(id)
			.await?
			.ok_or(SyncError::ReceiptNotFound(id))?;

		if let Some(remote_id) = receipt.remote_id_if_uploaded() {
			self.api
				.update_receipt(
					remote_id,
					&UpdateReceiptRequest {
						note: note.clone(),
						trip_id: trip.as_ref().map(|t| t.id.clone()),
					},
				)
				.await?;
		}

		self.store.update_metadata(id, note, trip).await?;

		Ok(())
	}
}
