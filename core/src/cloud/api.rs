//! Typed contract with the Shoebox service
//!
//! The engine consumes this trait; the reqwest implementation lives in
//! [`super::client`] and tests substitute their own.

use crate::domain::ServerStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error kinds surfaced by the API client. The queue processor branches on
/// `Unauthorized` (transient, requeue) vs everything else (permanent until
/// user action); `Conflict` only occurs on metadata updates.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
	#[error("authentication required")]
	Unauthorized,
	#[error("access denied")]
	Forbidden,
	#[error("receipt is locked by review")]
	Conflict,
	#[error("payload too large")]
	PayloadTooLarge,
	#[error("server error (status {0})")]
	Server(u16),
	#[error("transport error: {0}")]
	Transport(String),
	#[error("malformed response: {0}")]
	Decode(String),
}

/// Pre-authorized destination for one page blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDestination {
	/// Where the bytes get PUT.
	pub upload_url: String,
	/// Object path recorded on the page and echoed back at registration.
	pub remote_path: String,
}

/// Per-page descriptor sent when registering a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPageUpload {
	pub remote_path: String,
	pub file_name: String,
	pub file_size: i64,
	pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptRequest {
	pub account_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub trip_id: Option<String>,
	pub pages: Vec<ReceiptPageUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReceipt {
	pub id: String,
	pub status: ServerStatus,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceiptRequest {
	pub note: Option<String>,
	pub trip_id: Option<String>,
}

/// One entry of a batch status-check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStatusResult {
	pub id: String,
	pub status: ServerStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expense_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rejection_reason: Option<String>,
}

/// Request/response operations the engine performs against the service.
#[async_trait]
pub trait ReceiptsApi: Send + Sync {
	/// Obtain a pre-authorized upload destination for one page blob.
	async fn get_upload_destination(
		&self,
		account_id: &str,
		file_name: &str,
		content_type: &str,
		file_size: i64,
	) -> Result<UploadDestination, ApiError>;

	/// Register a fully uploaded receipt.
	async fn create_receipt(
		&self,
		request: &CreateReceiptRequest,
	) -> Result<CreatedReceipt, ApiError>;

	/// Update note/trip metadata of a registered receipt. Fails with
	/// [`ApiError::Conflict`] once review has locked the record.
	async fn update_receipt(
		&self,
		remote_id: &str,
		update: &UpdateReceiptRequest,
	) -> Result<(), ApiError>;

	/// Delete a registered receipt remotely.
	async fn delete_receipt(&self, remote_id: &str) -> Result<(), ApiError>;

	/// Batch review-status check.
	async fn check_statuses(
		&self,
		remote_ids: &[String],
	) -> Result<Vec<ReceiptStatusResult>, ApiError>;
}
