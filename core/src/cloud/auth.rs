//! Session token plumbing
//!
//! Auth flows live in the shell apps; the engine only ever asks for the
//! current bearer token right before a request goes out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
	pub token_type: String,
	pub access_token: String,
}

impl AccessToken {
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self {
			token_type: "Bearer".into(),
			access_token: access_token.into(),
		}
	}

	pub fn header_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token)
	}
}

/// Supplies the current session token, if any. `None` means the user is
/// signed out and surfaces as `ApiError::Unauthorized` before any request
/// is made.
#[async_trait]
pub trait TokenProvider: Send + Sync {
	async fn access_token(&self) -> Option<AccessToken>;
}

/// Fixed token, for tests and one-off tooling.
pub struct StaticTokenProvider(pub Option<AccessToken>);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
	async fn access_token(&self) -> Option<AccessToken> {
		self.0.clone()
	}
}
