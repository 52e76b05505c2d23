//! Delete and metadata-update tests

use super::*;
use crate::domain::TripRef;
use crate::sync::SyncError;

#[tokio::test]
async fn test_deleting_a_local_receipt_skips_the_service() {
	let env = TestEnv::new().await;
	let receipt = env.import_at("r", Utc::now(), 2).await;

	env.manager.delete_receipt(receipt.id).await.unwrap();

	assert!(env.store.receipt(receipt.id).await.unwrap().is_none());
	assert!(env.store.pages_of(receipt.id).await.unwrap().is_empty());
	assert!(!env.blobs.page_exists(receipt.id, "page_0001.jpg").await);
	assert!(env.api.calls().iter().all(|c| !matches!(c, ApiCall::Delete { .. })));
}

#[tokio::test]
async fn test_deleting_an_uploaded_receipt_confirms_remotely_first() {
	let env = TestEnv::new().await;
	let receipt = env.uploaded_receipt("r").await;
	let remote_id = receipt.server_receipt_id.clone().unwrap();

	env.manager.delete_receipt(receipt.id).await.unwrap();

	assert!(env.store.receipt(receipt.id).await.unwrap().is_none());
	assert!(env
		.api
		.calls()
		.contains(&ApiCall::Delete { remote_id }));
}

#[tokio::test]
async fn test_remote_delete_failure_leaves_everything_local_intact() {
	let env = TestEnv::new().await;
	let receipt = env.uploaded_receipt("r").await;

	env.api.fail_next_delete(ApiError::Server(500));
	let error = env.manager.delete_receipt(receipt.id).await.unwrap_err();
	assert!(matches!(error, SyncError::Api(ApiError::Server(500))));

	// Receipt, pages and blobs all survive the failed attempt
	assert!(env.store.receipt(receipt.id).await.unwrap().is_some());
	assert_eq!(env.store.pages_of(receipt.id).await.unwrap().len(), 1);
	assert!(env.blobs.page_exists(receipt.id, "page_0001.jpg").await);
}

#[tokio::test]
async fn test_metadata_update_on_local_receipt_stays_local() {
	let env = TestEnv::new().await;
	let receipt = env.import_at("r", Utc::now(), 1).await;

	env.manager
		.update_receipt_metadata(
			receipt.id,
			Some("parking".into()),
			Some(TripRef {
				id: "trip-1".into(),
				name: "Client visit".into(),
				date_label: None,
			}),
		)
		.await
		.unwrap();

	let reloaded = env.reload(receipt.id).await;
	assert_eq!(reloaded.note.as_deref(), Some("parking"));
	assert_eq!(reloaded.trip.unwrap().id, "trip-1");
	assert!(env.api.calls().iter().all(|c| !matches!(c, ApiCall::Update { .. })));
}

#[tokio::test]
async fn test_metadata_update_on_remote_receipt_goes_through_the_service() {
	let env = TestEnv::new().await;
	let receipt = env.uploaded_receipt("r").await;
	let remote_id = receipt.server_receipt_id.clone().unwrap();

	env.manager
		.update_receipt_metadata(receipt.id, Some("taxi".into()), None)
		.await
		.unwrap();

	assert_eq!(env.reload(receipt.id).await.note.as_deref(), Some("taxi"));
	assert!(env.api.calls().contains(&ApiCall::Update { remote_id }));
}

#[tokio::test]
async fn test_conflict_propagates_and_leaves_local_fields_untouched() {
	let env = TestEnv::new().await;
	let receipt = env.uploaded_receipt("original note").await;

	env.api.fail_next_update(ApiError::Conflict);
	let error = env
		.manager
		.update_receipt_metadata(
			receipt.id,
			Some("edited note".into()),
			Some(TripRef {
				id: "trip-9".into(),
				name: "Offsite".into(),
				date_label: None,
			}),
		)
		.await
		.unwrap_err();
	assert!(matches!(error, SyncError::Api(ApiError::Conflict)));

	let reloaded = env.reload(receipt.id).await;
	assert_eq!(reloaded.note.as_deref(), Some("original note"));
	assert!(reloaded.trip.is_none());
}
