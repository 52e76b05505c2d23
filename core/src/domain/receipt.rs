//! Receipt - one captured or imported document
//!
//! A receipt owns 1..N pages and carries two independently evolving status
//! fields: `sync_status` tracks local upload progress, `server_status` the
//! remote review outcome once the receipt has been registered.

use super::status::{ServerStatus, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Local record of one captured/imported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
	/// Client-generated stable identifier.
	pub id: Uuid,

	/// Account this receipt belongs to.
	pub account_id: String,

	/// Optional free-text note.
	pub note: Option<String>,

	/// Optional trip link, with display fields cached for offline use.
	pub trip: Option<TripRef>,

	/// When the document was captured or imported.
	pub captured_at: DateTime<Utc>,

	/// Image enhancement applied at capture time.
	pub enhancement: EnhancementMode,

	/// Local upload progress.
	pub sync_status: SyncStatus,

	/// Message recorded for the user when an upload fails.
	pub last_sync_error: Option<String>,

	/// Remote identifier, present iff the receipt was ever registered.
	pub server_receipt_id: Option<String>,

	/// Remote review outcome, meaningful only once uploaded.
	pub server_status: Option<ServerStatus>,

	/// When the reconciler observed the current `server_status`. Terminal
	/// outcomes age from this instant for retention purposes.
	pub server_status_changed_at: Option<DateTime<Utc>>,

	/// Reason supplied by the service when the receipt was rejected.
	pub rejection_reason: Option<String>,

	/// Expense created from this receipt, once processed.
	pub expense_id: Option<String>,

	/// True once the retention sweeper removed the local page blobs. The
	/// metadata rows survive for browsing.
	pub images_cleaned_up: bool,

	pub updated_at: DateTime<Utc>,
}

impl Receipt {
	/// Remote id of a receipt that is fully registered remotely. `None`
	/// while queued/uploading/failed, even during the brief window where a
	/// retried receipt still carries a stale remote id.
	pub fn remote_id_if_uploaded(&self) -> Option<&str> {
		match (&self.server_receipt_id, self.sync_status) {
			(Some(id), SyncStatus::Uploaded) => Some(id.as_str()),
			_ => None,
		}
	}

	/// Whether the review outcome is terminal (`processed` or `rejected`).
	pub fn review_is_terminal(&self) -> bool {
		self.server_status.is_some_and(ServerStatus::is_terminal)
	}
}

/// Cached trip link for offline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRef {
	pub id: String,
	pub name: String,
	/// Pre-rendered date range, e.g. "Mar 3 - Mar 7".
	pub date_label: Option<String>,
}

/// Enhancement applied by the capture pipeline.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnhancementMode {
	/// No processing, raw capture.
	Original,
	/// Auto color correction.
	#[default]
	Color,
	Grayscale,
	Monochrome,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn receipt(sync_status: SyncStatus, server_receipt_id: Option<&str>) -> Receipt {
		Receipt {
			id: Uuid::new_v4(),
			account_id: "acct-1".into(),
			note: None,
			trip: None,
			captured_at: Utc::now(),
			enhancement: EnhancementMode::default(),
			sync_status,
			last_sync_error: None,
			server_receipt_id: server_receipt_id.map(Into::into),
			server_status: None,
			server_status_changed_at: None,
			rejection_reason: None,
			expense_id: None,
			images_cleaned_up: false,
			updated_at: Utc::now(),
		}
	}

	#[test]
	fn test_remote_id_requires_uploaded_state() {
		assert_eq!(
			receipt(SyncStatus::Uploaded, Some("srv-1")).remote_id_if_uploaded(),
			Some("srv-1")
		);
		assert_eq!(receipt(SyncStatus::Queued, Some("srv-1")).remote_id_if_uploaded(), None);
		assert_eq!(receipt(SyncStatus::Uploaded, None).remote_id_if_uploaded(), None);
	}

	#[test]
	fn test_review_terminality() {
		let mut r = receipt(SyncStatus::Uploaded, Some("srv-1"));
		assert!(!r.review_is_terminal());
		r.server_status = Some(ServerStatus::Pending);
		assert!(!r.review_is_terminal());
		r.server_status = Some(ServerStatus::Rejected);
		assert!(r.review_is_terminal());
	}
}
