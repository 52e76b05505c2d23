//! End-to-end lifecycle: capture -> upload -> review outcome

use super::*;
use crate::domain::SyncStatus;

#[tokio::test]
async fn test_capture_upload_and_rejection_round_trip() {
	let env = TestEnv::new().await;

	let receipt = env.import_at("two pager", Utc::now(), 2).await;
	assert_eq!(receipt.sync_status, SyncStatus::Queued);

	env.manager.process_queue().await.unwrap();

	let uploaded = env.reload(receipt.id).await;
	assert_eq!(uploaded.sync_status, SyncStatus::Uploaded);
	assert_eq!(uploaded.server_status, Some(ServerStatus::Pending));
	let remote_id = uploaded.server_receipt_id.clone().expect("remote id");

	let pages = env.store.pages_of(receipt.id).await.unwrap();
	assert_eq!(pages.len(), 2);
	assert!(pages.iter().all(|p| p.remote_path.is_some()));

	// The registration carried both pages in order
	let create_pages = env
		.api
		.calls()
		.into_iter()
		.find_map(|c| match c {
			ApiCall::Create { pages, .. } => Some(pages),
			_ => None,
		})
		.unwrap();
	assert_eq!(create_pages.len(), 2);

	// Review comes back rejected
	env.api.push_status_batch(Ok(vec![ReceiptStatusResult {
		id: remote_id,
		status: ServerStatus::Rejected,
		expense_id: None,
		rejection_reason: Some("unreadable".into()),
	}]));
	env.manager.sync_receipt_statuses().await.unwrap();

	let rejected = env.reload(receipt.id).await;
	assert_eq!(rejected.sync_status, SyncStatus::Uploaded);
	assert_eq!(rejected.server_status, Some(ServerStatus::Rejected));
	assert_eq!(rejected.rejection_reason.as_deref(), Some("unreadable"));
}

#[tokio::test]
async fn test_import_produces_contiguous_page_order() {
	let env = TestEnv::new().await;
	let receipt = env.import_at("r", Utc::now(), 3).await;

	let pages = env.store.pages_of(receipt.id).await.unwrap();
	assert_eq!(
		pages.iter().map(|p| p.sort_order).collect::<Vec<_>>(),
		vec![1, 2, 3]
	);
	assert_eq!(pages[2].file_name, "page_0003.jpg");
	for page in &pages {
		assert!(env.blobs.page_exists(receipt.id, &page.file_name).await);
	}
}
