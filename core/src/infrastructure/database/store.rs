//! Receipt store - the single-writer boundary around the local database
//!
//! All mutations go through one instance of [`ReceiptStore`] and are
//! serialized behind its writer lock, so no two writers ever touch the same
//! record concurrently. Reads go straight to the connection.
//!
//! This is also the only module that sees the raw status strings the rows
//! carry; everything above works with the domain enums.

use super::entities::{page, receipt};
use crate::domain::{Page, PageKind, Receipt, ServerStatus, SyncStatus, TripRef};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
	ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
	PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, Value,
};
use std::str::FromStr;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] DbErr),
	#[error("receipt {0} not found")]
	NotFound(Uuid),
	#[error("page {0} not found")]
	PageNotFound(Uuid),
	#[error("receipt {receipt} carries an unknown stored value '{value}' for {field}")]
	CorruptRow {
		receipt: Uuid,
		field: &'static str,
		value: String,
	},
	#[error("a receipt needs at least one page")]
	EmptyReceipt,
	#[error("page sort orders must be contiguous starting at 1")]
	NonContiguousPages,
}

/// Per-status row counts for UI badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueOverview {
	pub queued: u64,
	pub uploading: u64,
	pub uploaded: u64,
	pub failed: u64,
}

/// Single-writer store for receipts and pages.
pub struct ReceiptStore {
	conn: DatabaseConnection,
	write_lock: Mutex<()>,
}

impl ReceiptStore {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self {
			conn,
			write_lock: Mutex::new(()),
		}
	}

	// --- queries ---

	pub async fn receipt(&self, id: Uuid) -> Result<Option<Receipt>, StoreError> {
		receipt::Entity::find_by_id(id)
			.one(&self.conn)
			.await?
			.map(receipt_from_row)
			.transpose()
	}

	/// Pages of a receipt in upload/presentation order.
	pub async fn pages_of(&self, receipt_id: Uuid) -> Result<Vec<Page>, StoreError> {
		page::Entity::find()
			.filter(page::Column::ReceiptId.eq(receipt_id))
			.order_by_asc(page::Column::SortOrder)
			.all(&self.conn)
			.await?
			.into_iter()
			.map(page_from_row)
			.collect()
	}

	/// Queued receipts, oldest capture first. This is the queue processor's
	/// work list; uploaded receipts are never selected here regardless of
	/// their review outcome.
	pub async fn queued_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
		self.receipts_with_status(SyncStatus::Queued).await
	}

	pub async fn failed_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
		self.receipts_with_status(SyncStatus::Failed).await
	}

	async fn receipts_with_status(&self, status: SyncStatus) -> Result<Vec<Receipt>, StoreError> {
		receipt::Entity::find()
			.filter(receipt::Column::SyncStatus.eq(status.to_string()))
			.order_by_asc(receipt::Column::CapturedAt)
			.all(&self.conn)
			.await?
			.into_iter()
			.map(receipt_from_row)
			.collect()
	}

	/// Uploaded receipts whose review outcome is still pending.
	pub async fn receipts_awaiting_review(&self) -> Result<Vec<Receipt>, StoreError> {
		receipt::Entity::find()
			.filter(receipt::Column::SyncStatus.eq(SyncStatus::Uploaded.to_string()))
			.filter(receipt::Column::ServerStatus.eq(ServerStatus::Pending.to_string()))
			.order_by_asc(receipt::Column::CapturedAt)
			.all(&self.conn)
			.await?
			.into_iter()
			.map(receipt_from_row)
			.collect()
	}

	/// Receipts whose review outcome turned terminal before `cutoff` and
	/// whose local page blobs are still around.
	pub async fn cleanup_candidates(
		&self,
		cutoff: DateTime<Utc>,
	) -> Result<Vec<Receipt>, StoreError> {
		receipt::Entity::find()
			.filter(receipt::Column::ServerStatus.is_in([
				ServerStatus::Processed.to_string(),
				ServerStatus::Rejected.to_string(),
			]))
			.filter(receipt::Column::ImagesCleanedUp.eq(false))
			.filter(receipt::Column::ServerStatusChangedAt.lte(cutoff))
			.all(&self.conn)
			.await?
			.into_iter()
			.map(receipt_from_row)
			.collect()
	}

	pub async fn queue_overview(&self) -> Result<QueueOverview, StoreError> {
		let count = |status: SyncStatus| {
			receipt::Entity::find()
				.filter(receipt::Column::SyncStatus.eq(status.to_string()))
				.count(&self.conn)
		};

		Ok(QueueOverview {
			queued: count(SyncStatus::Queued).await?,
			uploading: count(SyncStatus::Uploading).await?,
			uploaded: count(SyncStatus::Uploaded).await?,
			failed: count(SyncStatus::Failed).await?,
		})
	}

	// --- mutations (serialized behind the writer lock) ---

	/// Persist a freshly captured/imported receipt with its pages in one
	/// transaction. Receipts enter the store in `queued` state.
	pub async fn insert_receipt(&self, rcpt: &Receipt, pages: &[Page]) -> Result<(), StoreError> {
		if pages.is_empty() {
			return Err(StoreError::EmptyReceipt);
		}
		let mut orders: Vec<i32> = pages.iter().map(|p| p.sort_order).collect();
		orders.sort_unstable();
		if orders != (1..=pages.len() as i32).collect::<Vec<_>>() {
			return Err(StoreError::NonContiguousPages);
		}

		let _guard = self.write_lock.lock().await;
		let txn = self.conn.begin().await?;

		receipt_to_row(rcpt).insert(&txn).await?;
		page::Entity::insert_many(pages.iter().map(page_to_row))
			.exec(&txn)
			.await?;

		txn.commit().await?;
		Ok(())
	}

	/// Flip a receipt to `uploading` before any upload work starts, so a
	/// crash mid-upload is recoverable at next startup.
	pub async fn mark_uploading(&self, id: Uuid) -> Result<(), StoreError> {
		self.set_sync_status(id, SyncStatus::Uploading, None).await
	}

	/// Record a successful remote registration.
	pub async fn mark_uploaded(&self, id: Uuid, server_receipt_id: &str) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let row = receipt::Entity::find_by_id(id)
			.one(&self.conn)
			.await?
			.ok_or(StoreError::NotFound(id))?;

		let mut active: receipt::ActiveModel = row.into();
		active.sync_status = Set(SyncStatus::Uploaded.to_string());
		active.server_receipt_id = Set(Some(server_receipt_id.to_string()));
		active.server_status = Set(Some(ServerStatus::Pending.to_string()));
		active.last_sync_error = Set(None);
		active.updated_at = Set(Utc::now());
		active.update(&self.conn).await?;

		Ok(())
	}

	/// Record a permanent upload failure with the message shown to the user.
	pub async fn mark_failed(&self, id: Uuid, message: &str) -> Result<(), StoreError> {
		self.set_sync_status(id, SyncStatus::Failed, Some(message)).await
	}

	/// Put a receipt back in the queue, clearing any recorded failure.
	pub async fn requeue(&self, id: Uuid) -> Result<(), StoreError> {
		self.set_sync_status(id, SyncStatus::Queued, None).await
	}

	async fn set_sync_status(
		&self,
		id: Uuid,
		status: SyncStatus,
		error: Option<&str>,
	) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let result = receipt::Entity::update_many()
			.col_expr(receipt::Column::SyncStatus, Expr::value(status.to_string()))
			.col_expr(
				receipt::Column::LastSyncError,
				Expr::value(Value::String(error.map(|e| Box::new(e.to_string())))),
			)
			.col_expr(receipt::Column::UpdatedAt, Expr::value(Utc::now()))
			.filter(receipt::Column::Id.eq(id))
			.exec(&self.conn)
			.await?;

		if result.rows_affected == 0 {
			return Err(StoreError::NotFound(id));
		}
		Ok(())
	}

	/// Move every `failed` receipt back to `queued` in one statement.
	pub async fn requeue_failed(&self) -> Result<u64, StoreError> {
		self.transition_all(SyncStatus::Failed, SyncStatus::Queued).await
	}

	/// Reclaim stale `uploading` rows left behind by a crash or forced
	/// termination. Run once at startup before any queue pass; no other
	/// path ever selects `uploading` rows again.
	pub async fn reset_stuck_uploads(&self) -> Result<u64, StoreError> {
		self.transition_all(SyncStatus::Uploading, SyncStatus::Queued).await
	}

	async fn transition_all(&self, from: SyncStatus, to: SyncStatus) -> Result<u64, StoreError> {
		let _guard = self.write_lock.lock().await;

		let result = receipt::Entity::update_many()
			.col_expr(receipt::Column::SyncStatus, Expr::value(to.to_string()))
			.col_expr(
				receipt::Column::LastSyncError,
				Expr::value(Value::String(None)),
			)
			.col_expr(receipt::Column::UpdatedAt, Expr::value(Utc::now()))
			.filter(receipt::Column::SyncStatus.eq(from.to_string()))
			.exec(&self.conn)
			.await?;

		Ok(result.rows_affected)
	}

	/// Record the remote object path of an uploaded page. Once set it stays
	/// set for the lifetime of the receipt.
	pub async fn set_page_remote_path(
		&self,
		page_id: Uuid,
		remote_path: &str,
	) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let result = page::Entity::update_many()
			.col_expr(page::Column::RemotePath, Expr::value(remote_path.to_string()))
			.filter(page::Column::Id.eq(page_id))
			.exec(&self.conn)
			.await?;

		if result.rows_affected == 0 {
			return Err(StoreError::PageNotFound(page_id));
		}
		Ok(())
	}

	/// Merge a review outcome reported by the service.
	pub async fn apply_review_outcome(
		&self,
		id: Uuid,
		status: ServerStatus,
		rejection_reason: Option<String>,
		expense_id: Option<String>,
		observed_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let row = receipt::Entity::find_by_id(id)
			.one(&self.conn)
			.await?
			.ok_or(StoreError::NotFound(id))?;

		let mut active: receipt::ActiveModel = row.into();
		active.server_status = Set(Some(status.to_string()));
		active.server_status_changed_at = Set(Some(observed_at));
		active.rejection_reason = Set(match status {
			ServerStatus::Rejected => rejection_reason,
			_ => None,
		});
		if expense_id.is_some() {
			active.expense_id = Set(expense_id);
		}
		active.updated_at = Set(Utc::now());
		active.update(&self.conn).await?;

		Ok(())
	}

	/// Replace note and trip link. The caller has already cleared the write
	/// with the remote side when the receipt is remote.
	pub async fn update_metadata(
		&self,
		id: Uuid,
		note: Option<String>,
		trip: Option<TripRef>,
	) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let row = receipt::Entity::find_by_id(id)
			.one(&self.conn)
			.await?
			.ok_or(StoreError::NotFound(id))?;

		let mut active: receipt::ActiveModel = row.into();
		active.note = Set(note);
		active.trip_id = Set(trip.as_ref().map(|t| t.id.clone()));
		active.trip_name = Set(trip.as_ref().map(|t| t.name.clone()));
		active.trip_date_label = Set(trip.and_then(|t| t.date_label));
		active.updated_at = Set(Utc::now());
		active.update(&self.conn).await?;

		Ok(())
	}

	/// Record that the retention sweeper removed this receipt's local blobs.
	pub async fn mark_images_cleaned(&self, id: Uuid) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;

		let result = receipt::Entity::update_many()
			.col_expr(receipt::Column::ImagesCleanedUp, Expr::value(true))
			.col_expr(receipt::Column::UpdatedAt, Expr::value(Utc::now()))
			.filter(receipt::Column::Id.eq(id))
			.exec(&self.conn)
			.await?;

		if result.rows_affected == 0 {
			return Err(StoreError::NotFound(id));
		}
		Ok(())
	}

	/// Delete a receipt and its pages in one transaction.
	pub async fn delete_receipt(&self, id: Uuid) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock().await;
		let txn = self.conn.begin().await?;

		page::Entity::delete_many()
			.filter(page::Column::ReceiptId.eq(id))
			.exec(&txn)
			.await?;
		let result = receipt::Entity::delete_by_id(id).exec(&txn).await?;
		if result.rows_affected == 0 {
			return Err(StoreError::NotFound(id));
		}

		txn.commit().await?;
		Ok(())
	}
}

// --- row conversions ---

fn receipt_from_row(row: receipt::Model) -> Result<Receipt, StoreError> {
	let sync_status = SyncStatus::from_str(&row.sync_status).map_err(|_| StoreError::CorruptRow {
		receipt: row.id,
		field: "sync_status",
		value: row.sync_status.clone(),
	})?;
	let server_status = row
		.server_status
		.as_deref()
		.map(|s| {
			ServerStatus::from_str(s).map_err(|_| StoreError::CorruptRow {
				receipt: row.id,
				field: "server_status",
				value: s.to_string(),
			})
		})
		.transpose()?;
	let enhancement =
		crate::domain::EnhancementMode::from_str(&row.enhancement).map_err(|_| {
			StoreError::CorruptRow {
				receipt: row.id,
				field: "enhancement",
				value: row.enhancement.clone(),
			}
		})?;
	let trip = row.trip_id.map(|id| TripRef {
		id,
		name: row.trip_name.unwrap_or_default(),
		date_label: row.trip_date_label,
	});

	Ok(Receipt {
		id: row.id,
		account_id: row.account_id,
		note: row.note,
		trip,
		captured_at: row.captured_at,
		enhancement,
		sync_status,
		last_sync_error: row.last_sync_error,
		server_receipt_id: row.server_receipt_id,
		server_status,
		server_status_changed_at: row.server_status_changed_at,
		rejection_reason: row.rejection_reason,
		expense_id: row.expense_id,
		images_cleaned_up: row.images_cleaned_up,
		updated_at: row.updated_at,
	})
}

fn receipt_to_row(rcpt: &Receipt) -> receipt::ActiveModel {
	receipt::ActiveModel {
		id: Set(rcpt.id),
		account_id: Set(rcpt.account_id.clone()),
		note: Set(rcpt.note.clone()),
		trip_id: Set(rcpt.trip.as_ref().map(|t| t.id.clone())),
		trip_name: Set(rcpt.trip.as_ref().map(|t| t.name.clone())),
		trip_date_label: Set(rcpt.trip.as_ref().and_then(|t| t.date_label.clone())),
		captured_at: Set(rcpt.captured_at),
		enhancement: Set(rcpt.enhancement.to_string()),
		sync_status: Set(rcpt.sync_status.to_string()),
		last_sync_error: Set(rcpt.last_sync_error.clone()),
		server_receipt_id: Set(rcpt.server_receipt_id.clone()),
		server_status: Set(rcpt.server_status.map(|s| s.to_string())),
		server_status_changed_at: Set(rcpt.server_status_changed_at),
		rejection_reason: Set(rcpt.rejection_reason.clone()),
		expense_id: Set(rcpt.expense_id.clone()),
		images_cleaned_up: Set(rcpt.images_cleaned_up),
		updated_at: Set(rcpt.updated_at),
	}
}

fn page_from_row(row: page::Model) -> Result<Page, StoreError> {
	let kind = PageKind::from_str(&row.kind).map_err(|_| StoreError::CorruptRow {
		receipt: row.receipt_id,
		field: "kind",
		value: row.kind.clone(),
	})?;

	Ok(Page {
		id: row.id,
		receipt_id: row.receipt_id,
		sort_order: row.sort_order,
		file_name: row.file_name,
		file_size: row.file_size,
		kind,
		remote_path: row.remote_path,
	})
}

fn page_to_row(pg: &Page) -> page::ActiveModel {
	page::ActiveModel {
		id: Set(pg.id),
		receipt_id: Set(pg.receipt_id),
		sort_order: Set(pg.sort_order),
		file_name: Set(pg.file_name.clone()),
		file_size: Set(pg.file_size),
		kind: Set(pg.kind.to_string()),
		remote_path: Set(pg.remote_path.clone()),
	}
}
