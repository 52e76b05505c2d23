//! Reqwest implementation of the service contract

use super::api::{
	ApiError, CreateReceiptRequest, CreatedReceipt, ReceiptStatusResult, ReceiptsApi,
	UpdateReceiptRequest, UploadDestination,
};
use super::auth::{AccessToken, TokenProvider};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

pub struct ApiClient {
	http: reqwest::Client,
	base_url: String,
	tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
	pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
		Self {
			http: reqwest::Client::new(),
			base_url: base_url.into(),
			tokens,
		}
	}

	async fn token(&self) -> Result<AccessToken, ApiError> {
		self.tokens.access_token().await.ok_or(ApiError::Unauthorized)
	}

	async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
		let token = self.token().await?;
		let response = req
			.header("authorization", token.header_value())
			.send()
			.await
			.map_err(|e| ApiError::Transport(e.to_string()))?;

		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		Err(match status.as_u16() {
			401 => ApiError::Unauthorized,
			403 => ApiError::Forbidden,
			409 => ApiError::Conflict,
			413 => ApiError::PayloadTooLarge,
			code => ApiError::Server(code),
		})
	}

	async fn send_json<T: DeserializeOwned>(
		&self,
		req: reqwest::RequestBuilder,
	) -> Result<T, ApiError> {
		self.send(req)
			.await?
			.json()
			.await
			.map_err(|e| ApiError::Decode(e.to_string()))
	}
}

#[async_trait]
impl ReceiptsApi for ApiClient {
	async fn get_upload_destination(
		&self,
		account_id: &str,
		file_name: &str,
		content_type: &str,
		file_size: i64,
	) -> Result<UploadDestination, ApiError> {
		self.send_json(
			self.http
				.post(format!(
					"{}/api/v1/accounts/{}/uploads",
					self.base_url, account_id
				))
				.json(&json!({
					"fileName": file_name,
					"contentType": content_type,
					"fileSize": file_size,
				})),
		)
		.await
	}

	async fn create_receipt(
		&self,
		request: &CreateReceiptRequest,
	) -> Result<CreatedReceipt, ApiError> {
		self.send_json(
			self.http
				.post(format!("{}/api/v1/receipts", self.base_url))
				.json(request),
		)
		.await
	}

	async fn update_receipt(
		&self,
		remote_id: &str,
		update: &UpdateReceiptRequest,
	) -> Result<(), ApiError> {
		self.send(
			self.http
				.patch(format!("{}/api/v1/receipts/{}", self.base_url, remote_id))
				.json(update),
		)
		.await
		.map(|_| ())
	}

	async fn delete_receipt(&self, remote_id: &str) -> Result<(), ApiError> {
		self.send(
			self.http
				.delete(format!("{}/api/v1/receipts/{}", self.base_url, remote_id)),
		)
		.await
		.map(|_| ())
	}

	async fn check_statuses(
		&self,
		remote_ids: &[String],
	) -> Result<Vec<ReceiptStatusResult>, ApiError> {
		self.send_json(
			self.http
				.post(format!("{}/api/v1/receipts/statuses", self.base_url))
				.json(&json!({ "ids": remote_ids })),
		)
		.await
	}
}
