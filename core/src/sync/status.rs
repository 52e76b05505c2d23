//! Review-status reconciler
//!
//! Polls the service for receipts sitting in `uploaded`/`pending` and
//! merges terminal outcomes. Everything here is convergent: a failed batch
//! or a failed save is simply retried on the next cycle, so failures are
//! absorbed, not propagated.

use super::{best_effort, SyncError, SyncManager};
use crate::cloud::api::ReceiptStatusResult;
use crate::domain::ServerStatus;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

impl SyncManager {
	/// Poll the review outcome of every receipt still pending, in fixed-size
	/// batches. Terminal outcomes (`processed`/`rejected`) leave the pending
	/// filter and are never polled again.
	pub async fn sync_receipt_statuses(&self) -> Result<(), SyncError> {
		if !self.is_connected() {
			debug!("skipping status sync, no connectivity");
			return Ok(());
		}

		let awaiting = self.store.receipts_awaiting_review().await?;
		if awaiting.is_empty() {
			return Ok(());
		}
		debug!(count = awaiting.len(), "checking review statuses");

		for batch in awaiting.chunks(self.settings.status_batch_size) {
			let ids: Vec<String> = batch
				.iter()
				.filter_map(|r| r.server_receipt_id.clone())
				.collect();

			// One bad batch must not stall the others.
			let Some(results) = best_effort(
				"status check batch",
				self.api.check_statuses(&ids).await,
			) else {
				continue;
			};

			let by_id: HashMap<String, ReceiptStatusResult> =
				results.into_iter().map(|r| (r.id.clone(), r)).collect();

			for receipt in batch {
				let Some(remote_id) = receipt.server_receipt_id.as_deref() else {
					continue;
				};
				let Some(result) = by_id.get(remote_id) else {
					continue;
				};

				match result.status {
					// Still under review.
					ServerStatus::Pending => {}
					outcome => {
						let saved = best_effort(
							"persisting review outcome",
							self.store
								.apply_review_outcome(
									receipt.id,
									outcome,
									result.rejection_reason.clone(),
									result.expense_id.clone(),
									Utc::now(),
								)
								.await,
						);
						if saved.is_some() {
							info!(
								receipt_id = %receipt.id,
								outcome = %outcome,
								"review outcome merged"
							);
						}
					}
				}
			}
		}

		Ok(())
	}
}
