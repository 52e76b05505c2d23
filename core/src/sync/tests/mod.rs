//! Engine tests: real store (in-memory SQLite) and blob dir, mocked
//! service collaborators with scripted responses and call recording.

mod lifecycle;
mod records;

use crate::cloud::api::{
	ApiError, CreateReceiptRequest, CreatedReceipt, ReceiptStatusResult, ReceiptsApi,
	UpdateReceiptRequest, UploadDestination,
};
use crate::cloud::transport::{UploadError, UploadTransport};
use crate::domain::{EnhancementMode, PageKind, Receipt, ServerStatus};
use crate::infrastructure::blob::BlobStorage;
use crate::infrastructure::database::{Database, ReceiptStore};
use crate::operations::import::{import_receipt, ImportRequest, NewPage};
use crate::sync::{SyncManager, SyncSettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
	Destination { file_name: String },
	Create { note: Option<String>, pages: Vec<String> },
	Update { remote_id: String },
	Delete { remote_id: String },
	CheckStatuses { ids: Vec<String> },
}

#[derive(Default)]
struct MockApiState {
	destination_failures: VecDeque<ApiError>,
	create_failures: VecDeque<ApiError>,
	update_failures: VecDeque<ApiError>,
	delete_failures: VecDeque<ApiError>,
	status_batches: VecDeque<Result<Vec<ReceiptStatusResult>, ApiError>>,
	destination_seq: u32,
	create_seq: u32,
	calls: Vec<ApiCall>,
}

/// Scripted service double. Unscripted calls succeed with generated
/// destinations/ids; status checks default to "everything still pending".
#[derive(Default)]
pub struct MockApi {
	state: Mutex<MockApiState>,
}

impl MockApi {
	pub fn fail_next_destination(&self, error: ApiError) {
		self.state.lock().unwrap().destination_failures.push_back(error);
	}

	pub fn fail_next_create(&self, error: ApiError) {
		self.state.lock().unwrap().create_failures.push_back(error);
	}

	pub fn fail_next_update(&self, error: ApiError) {
		self.state.lock().unwrap().update_failures.push_back(error);
	}

	pub fn fail_next_delete(&self, error: ApiError) {
		self.state.lock().unwrap().delete_failures.push_back(error);
	}

	pub fn push_status_batch(&self, batch: Result<Vec<ReceiptStatusResult>, ApiError>) {
		self.state.lock().unwrap().status_batches.push_back(batch);
	}

	pub fn calls(&self) -> Vec<ApiCall> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn create_notes(&self) -> Vec<Option<String>> {
		self.calls()
			.into_iter()
			.filter_map(|c| match c {
				ApiCall::Create { note, .. } => Some(note),
				_ => None,
			})
			.collect()
	}

	pub fn create_count(&self) -> usize {
		self.create_notes().len()
	}

	pub fn destination_count_for(&self, file_name: &str) -> usize {
		self.calls()
			.iter()
			.filter(|c| matches!(c, ApiCall::Destination { file_name: f } if f == file_name))
			.count()
	}

	pub fn status_check_count(&self) -> usize {
		self.calls()
			.iter()
			.filter(|c| matches!(c, ApiCall::CheckStatuses { .. }))
			.count()
	}
}

#[async_trait]
impl ReceiptsApi for MockApi {
	async fn get_upload_destination(
		&self,
		_account_id: &str,
		file_name: &str,
		_content_type: &str,
		_file_size: i64,
	) -> Result<UploadDestination, ApiError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(ApiCall::Destination {
			file_name: file_name.to_string(),
		});
		if let Some(error) = state.destination_failures.pop_front() {
			return Err(error);
		}
		state.destination_seq += 1;
		let seq = state.destination_seq;
		Ok(UploadDestination {
			upload_url: format!("https://blobs.shoebox.test/put/{seq}"),
			remote_path: format!("objects/{seq:04}/{file_name}"),
		})
	}

	async fn create_receipt(
		&self,
		request: &CreateReceiptRequest,
	) -> Result<CreatedReceipt, ApiError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(ApiCall::Create {
			note: request.note.clone(),
			pages: request.pages.iter().map(|p| p.remote_path.clone()).collect(),
		});
		if let Some(error) = state.create_failures.pop_front() {
			return Err(error);
		}
		state.create_seq += 1;
		Ok(CreatedReceipt {
			id: format!("srv-{}", state.create_seq),
			status: ServerStatus::Pending,
			created_at: Utc::now(),
		})
	}

	async fn update_receipt(
		&self,
		remote_id: &str,
		_update: &UpdateReceiptRequest,
	) -> Result<(), ApiError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(ApiCall::Update {
			remote_id: remote_id.to_string(),
		});
		match state.update_failures.pop_front() {
			Some(error) => Err(error),
			None => Ok(()),
		}
	}

	async fn delete_receipt(&self, remote_id: &str) -> Result<(), ApiError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(ApiCall::Delete {
			remote_id: remote_id.to_string(),
		});
		match state.delete_failures.pop_front() {
			Some(error) => Err(error),
			None => Ok(()),
		}
	}

	async fn check_statuses(
		&self,
		remote_ids: &[String],
	) -> Result<Vec<ReceiptStatusResult>, ApiError> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(ApiCall::CheckStatuses {
			ids: remote_ids.to_vec(),
		});
		if let Some(batch) = state.status_batches.pop_front() {
			return batch;
		}
		Ok(remote_ids
			.iter()
			.map(|id| ReceiptStatusResult {
				id: id.clone(),
				status: ServerStatus::Pending,
				expense_id: None,
				rejection_reason: None,
			})
			.collect())
	}
}

/// Lets a test hold an in-flight PUT open to observe single-flight.
#[derive(Clone)]
pub struct PutGate {
	pub entered: Arc<Notify>,
	pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct MockTransport {
	results: Mutex<VecDeque<Result<(), UploadError>>>,
	puts: Mutex<Vec<String>>,
	gate: Mutex<Option<PutGate>>,
}

impl MockTransport {
	pub fn script_puts(&self, results: Vec<Result<(), UploadError>>) {
		self.results.lock().unwrap().extend(results);
	}

	pub fn hold_next_put(&self) -> PutGate {
		let gate = PutGate {
			entered: Arc::new(Notify::new()),
			release: Arc::new(Notify::new()),
		};
		*self.gate.lock().unwrap() = Some(gate.clone());
		gate
	}

	pub fn put_count(&self) -> usize {
		self.puts.lock().unwrap().len()
	}
}

#[async_trait]
impl UploadTransport for MockTransport {
	async fn put(
		&self,
		_bytes: Vec<u8>,
		destination: &UploadDestination,
		_content_type: &str,
	) -> Result<(), UploadError> {
		self.puts.lock().unwrap().push(destination.remote_path.clone());
		let gate = self.gate.lock().unwrap().take();
		if let Some(gate) = gate {
			gate.entered.notify_one();
			gate.release.notified().await;
		}
		let next = self.results.lock().unwrap().pop_front();
		next.unwrap_or(Ok(()))
	}
}

pub struct TestEnv {
	pub manager: Arc<SyncManager>,
	pub store: Arc<ReceiptStore>,
	pub blobs: Arc<BlobStorage>,
	pub api: Arc<MockApi>,
	pub uploads: Arc<MockTransport>,
	_tmp: tempfile::TempDir,
}

impl TestEnv {
	pub async fn new() -> Self {
		Self::with_settings(SyncSettings::default()).await
	}

	pub async fn with_settings(settings: SyncSettings) -> Self {
		let db = Database::create_in_memory().await.unwrap();
		db.migrate().await.unwrap();
		let store = Arc::new(ReceiptStore::new(db.into_conn()));

		let tmp = tempfile::tempdir().unwrap();
		let blobs = Arc::new(BlobStorage::new(tmp.path()));

		let api = Arc::new(MockApi::default());
		let uploads = Arc::new(MockTransport::default());

		let manager = Arc::new(SyncManager::new(
			store.clone(),
			blobs.clone(),
			api.clone(),
			uploads.clone(),
			settings,
		));
		// Engines start offline; tests run connected unless they say so.
		manager.handle_network_change(true).await;

		Self {
			manager,
			store,
			blobs,
			api,
			uploads,
			_tmp: tmp,
		}
	}

	/// Import a receipt with `page_count` pages; the label ends up in the
	/// note so tests can follow a receipt through recorded API calls.
	pub async fn import_at(
		&self,
		label: &str,
		captured_at: DateTime<Utc>,
		page_count: usize,
	) -> Receipt {
		import_receipt(
			&self.store,
			&self.blobs,
			ImportRequest {
				account_id: "acct-1".into(),
				note: Some(label.into()),
				trip: None,
				enhancement: EnhancementMode::Color,
				captured_at,
				pages: (0..page_count)
					.map(|i| NewPage {
						bytes: format!("{label}-{i}").into_bytes(),
						thumbnail: Some(b"thumb".to_vec()),
						kind: PageKind::Image,
					})
					.collect(),
			},
		)
		.await
		.unwrap()
	}

	/// Import one receipt and run it through the queue successfully.
	pub async fn uploaded_receipt(&self, label: &str) -> Receipt {
		let receipt = self.import_at(label, Utc::now(), 1).await;
		self.manager.process_queue().await.unwrap();
		self.reload(receipt.id).await
	}

	pub async fn reload(&self, id: Uuid) -> Receipt {
		self.store.receipt(id).await.unwrap().unwrap()
	}
}
