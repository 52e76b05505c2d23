//! Sync and review status state machines
//!
//! Both statuses are persisted as strings but only cross that boundary in
//! the store layer. Business logic works with these enums exclusively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Local upload progress of a receipt.
///
/// `Uploading` is only valid while an upload call stack is live; any
/// `Uploading` row found at startup is stale and gets reclaimed to `Queued`
/// before the first queue pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
	/// Waiting for the next queue pass.
	Queued,
	/// An upload call stack currently owns this receipt.
	Uploading,
	/// Registered remotely; terminal as far as the upload queue goes.
	Uploaded,
	/// Upload failed; waits for an explicit user retry.
	Failed,
}

/// Review outcome reported by the service, meaningful only once the
/// receipt is `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServerStatus {
	/// Still under review; polled by the status reconciler.
	Pending,
	/// Reviewed and turned into an expense.
	Processed,
	/// Reviewed and rejected, with a reason attached.
	Rejected,
}

impl ServerStatus {
	/// Terminal outcomes are never polled again.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Processed | Self::Rejected)
	}
}
