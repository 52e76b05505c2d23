//! Blob upload transport
//!
//! A plain PUT of page bytes to a pre-authorized destination. Success is
//! any 2xx; everything else is reported by status code.

use super::api::UploadDestination;
use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
	#[error("upload rejected (status {0})")]
	Status(u16),
	#[error("upload transport error: {0}")]
	Transport(String),
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
	async fn put(
		&self,
		bytes: Vec<u8>,
		destination: &UploadDestination,
		content_type: &str,
	) -> Result<(), UploadError>;
}

pub struct HttpUploadTransport {
	http: reqwest::Client,
}

impl HttpUploadTransport {
	pub fn new() -> Self {
		Self {
			http: reqwest::Client::new(),
		}
	}
}

impl Default for HttpUploadTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
	async fn put(
		&self,
		bytes: Vec<u8>,
		destination: &UploadDestination,
		content_type: &str,
	) -> Result<(), UploadError> {
		let response = self
			.http
			.put(&destination.upload_url)
			.header("content-type", content_type)
			.body(bytes)
			.send()
			.await
			.map_err(|e| UploadError::Transport(e.to_string()))?;

		let status = response.status();
		if status.is_success() {
			Ok(())
		} else {
			Err(UploadError::Status(status.as_u16()))
		}
	}
}
