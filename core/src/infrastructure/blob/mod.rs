//! Local page blob storage
//!
//! Layout: one directory per receipt id under `<root>/receipts/`, holding
//! numbered page blobs plus their thumbnails:
//!
//! ```text
//! receipts/<receipt-id>/page_0001.jpg
//! receipts/<receipt-id>/page_0001.thumb.jpg
//! ```
//!
//! The retention sweeper removes the files but keeps the metadata rows;
//! explicit deletion removes the whole directory.

use crate::domain::{Page, PageKind};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
	#[error("blob I/O error: {0}")]
	Io(#[from] io::Error),
}

pub struct BlobStorage {
	root: PathBuf,
}

impl BlobStorage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Canonical blob file name for a page position.
	pub fn page_file_name(sort_order: i32, kind: PageKind) -> String {
		format!("page_{:04}.{}", sort_order, kind.file_extension())
	}

	pub fn receipt_dir(&self, receipt_id: Uuid) -> PathBuf {
		self.root.join("receipts").join(receipt_id.to_string())
	}

	pub fn page_path(&self, receipt_id: Uuid, file_name: &str) -> PathBuf {
		self.receipt_dir(receipt_id).join(file_name)
	}

	fn thumbnail_path(&self, receipt_id: Uuid, file_name: &str) -> PathBuf {
		let stem = file_name.rsplit_once('.').map_or(file_name, |(s, _)| s);
		self.receipt_dir(receipt_id).join(format!("{stem}.thumb.jpg"))
	}

	/// Write a page blob (and optionally its thumbnail) at import time.
	pub async fn write_page(
		&self,
		receipt_id: Uuid,
		file_name: &str,
		bytes: &[u8],
		thumbnail: Option<&[u8]>,
	) -> Result<(), BlobError> {
		let dir = self.receipt_dir(receipt_id);
		fs::create_dir_all(&dir).await?;
		fs::write(dir.join(file_name), bytes).await?;
		if let Some(thumb) = thumbnail {
			fs::write(self.thumbnail_path(receipt_id, file_name), thumb).await?;
		}
		Ok(())
	}

	/// Read a page blob for upload. A missing file surfaces as an error;
	/// the queue processor treats it as an upload failure for the receipt.
	pub async fn read_page(&self, receipt_id: Uuid, file_name: &str) -> Result<Vec<u8>, BlobError> {
		Ok(fs::read(self.page_path(receipt_id, file_name)).await?)
	}

	pub async fn page_exists(&self, receipt_id: Uuid, file_name: &str) -> bool {
		fs::try_exists(self.page_path(receipt_id, file_name))
			.await
			.unwrap_or(false)
	}

	/// Remove the page blobs and thumbnails of a receipt, keeping nothing
	/// behind. Already-missing files are fine; the sweep may have been
	/// interrupted half-way through last time.
	pub async fn remove_page_files(
		&self,
		receipt_id: Uuid,
		pages: &[Page],
	) -> Result<(), BlobError> {
		for page in pages {
			remove_if_present(&self.page_path(receipt_id, &page.file_name)).await?;
			remove_if_present(&self.thumbnail_path(receipt_id, &page.file_name)).await?;
		}
		// Drop the directory too when nothing else is in it.
		if let Ok(mut entries) = fs::read_dir(self.receipt_dir(receipt_id)).await {
			if entries.next_entry().await?.is_none() {
				remove_dir_if_present(&self.receipt_dir(receipt_id)).await?;
			}
		}
		debug!(receipt_id = %receipt_id, "removed local page blobs");
		Ok(())
	}

	/// Remove the receipt's whole blob directory (explicit deletion).
	pub async fn remove_receipt_dir(&self, receipt_id: Uuid) -> Result<(), BlobError> {
		let dir = self.receipt_dir(receipt_id);
		match fs::remove_dir_all(&dir).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

async fn remove_if_present(path: &Path) -> Result<(), BlobError> {
	match fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e.into()),
	}
}

async fn remove_dir_if_present(path: &Path) -> Result<(), BlobError> {
	match fs::remove_dir(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e.into()),
	}
}
