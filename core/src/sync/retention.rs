//! Retention sweeper
//!
//! Reclaims local blob storage for receipts whose review outcome has been
//! terminal for longer than the retention window. Rows survive with
//! `images_cleaned_up = true`, trading storage for permanently browsable
//! history; the removal is irreversible for those images.

use super::{best_effort, SyncError, SyncManager};
use chrono::{Duration, Utc};
use tracing::{debug, info};

impl SyncManager {
	/// Sweep terminal receipts past the retention window. Run on launch or
	/// foreground; every step is best-effort and picked up again on the
	/// next sweep if it fails half-way.
	pub async fn perform_cleanup(&self) -> Result<(), SyncError> {
		let cutoff = Utc::now() - Duration::days(i64::from(self.settings.retention_days));
		let candidates = self.store.cleanup_candidates(cutoff).await?;
		if candidates.is_empty() {
			return Ok(());
		}
		debug!(count = candidates.len(), "sweeping local blobs past retention");

		let mut swept = 0u32;
		for receipt in candidates {
			let Some(pages) = best_effort(
				"loading pages for retention sweep",
				self.store.pages_of(receipt.id).await,
			) else {
				continue;
			};

			// Only record the cleanup once the files are really gone;
			// otherwise the receipt stays a candidate for the next sweep.
			if best_effort(
				"removing page blobs",
				self.blobs.remove_page_files(receipt.id, &pages).await,
			)
			.is_none()
			{
				continue;
			}

			if best_effort(
				"recording blob cleanup",
				self.store.mark_images_cleaned(receipt.id).await,
			)
			.is_some()
			{
				swept += 1;
			}
		}

		if swept > 0 {
			info!(count = swept, "reclaimed local storage for reviewed receipts");
		}

		Ok(())
	}
}
