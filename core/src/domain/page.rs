//! Page - one physical sheet/image within a receipt

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// One page of a receipt, ordered by `sort_order` within its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	pub id: Uuid,

	/// Owning receipt (non-owning back-reference).
	pub receipt_id: Uuid,

	/// Position within the receipt; contiguous and unique per receipt.
	pub sort_order: i32,

	/// Blob file name inside the receipt's blob directory.
	pub file_name: String,

	/// Size of the local blob in bytes, recorded at import.
	pub file_size: i64,

	pub kind: PageKind,

	/// Object path on the remote store, set only after this page was
	/// uploaded. Once set it is never cleared short of deleting the
	/// whole receipt.
	pub remote_path: Option<String>,
}

/// What kind of blob a page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PageKind {
	/// Camera capture or imported photo.
	Image,
	/// Imported document page (PDF).
	Document,
}

impl PageKind {
	pub fn mime_type(self) -> &'static str {
		match self {
			Self::Image => "image/jpeg",
			Self::Document => "application/pdf",
		}
	}

	pub fn file_extension(self) -> &'static str {
		match self {
			Self::Image => "jpg",
			Self::Document => "pdf",
		}
	}
}
