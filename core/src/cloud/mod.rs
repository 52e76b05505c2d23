//! Cloud collaborators: typed API client and blob upload transport

pub mod api;
pub mod auth;
pub mod client;
pub mod transport;

pub use api::{ApiError, ReceiptsApi};
pub use auth::{AccessToken, TokenProvider};
pub use client::ApiClient;
pub use transport::{HttpUploadTransport, UploadError, UploadTransport};
