//! Initial migration to create the receipts and pages tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Receipts::Table)
					.if_not_exists()
					.col(ColumnDef::new(Receipts::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(Receipts::AccountId).string().not_null())
					.col(ColumnDef::new(Receipts::Note).string())
					.col(ColumnDef::new(Receipts::TripId).string())
					.col(ColumnDef::new(Receipts::TripName).string())
					.col(ColumnDef::new(Receipts::TripDateLabel).string())
					.col(ColumnDef::new(Receipts::CapturedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(Receipts::Enhancement).string().not_null())
					.col(ColumnDef::new(Receipts::SyncStatus).string().not_null())
					.col(ColumnDef::new(Receipts::LastSyncError).string())
					.col(ColumnDef::new(Receipts::ServerReceiptId).string())
					.col(ColumnDef::new(Receipts::ServerStatus).string())
					.col(ColumnDef::new(Receipts::ServerStatusChangedAt).timestamp_with_time_zone())
					.col(ColumnDef::new(Receipts::RejectionReason).string())
					.col(ColumnDef::new(Receipts::ExpenseId).string())
					.col(
						ColumnDef::new(Receipts::ImagesCleanedUp)
							.boolean()
							.not_null()
							.default(false),
					)
					.col(ColumnDef::new(Receipts::UpdatedAt).timestamp_with_time_zone().not_null())
					.to_owned(),
			)
			.await?;

		// The queue processor and reconciler both select by status
		manager
			.create_index(
				Index::create()
					.name("idx_receipts_sync_status")
					.table(Receipts::Table)
					.col(Receipts::SyncStatus)
					.to_owned(),
			)
			.await?;
		manager
			.create_index(
				Index::create()
					.name("idx_receipts_server_status")
					.table(Receipts::Table)
					.col(Receipts::ServerStatus)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Pages::Table)
					.if_not_exists()
					.col(ColumnDef::new(Pages::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(Pages::ReceiptId).uuid().not_null())
					.col(ColumnDef::new(Pages::SortOrder).integer().not_null())
					.col(ColumnDef::new(Pages::FileName).string().not_null())
					.col(ColumnDef::new(Pages::FileSize).big_integer().not_null())
					.col(ColumnDef::new(Pages::Kind).string().not_null())
					.col(ColumnDef::new(Pages::RemotePath).string())
					.foreign_key(
						ForeignKey::create()
							.from(Pages::Table, Pages::ReceiptId)
							.to(Receipts::Table, Receipts::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// sort_order is contiguous and unique within a receipt
		manager
			.create_index(
				Index::create()
					.name("idx_pages_receipt_sort")
					.table(Pages::Table)
					.col(Pages::ReceiptId)
					.col(Pages::SortOrder)
					.unique()
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(Pages::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Receipts::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum Receipts {
	Table,
	Id,
	AccountId,
	Note,
	TripId,
	TripName,
	TripDateLabel,
	CapturedAt,
	Enhancement,
	SyncStatus,
	LastSyncError,
	ServerReceiptId,
	ServerStatus,
	ServerStatusChangedAt,
	RejectionReason,
	ExpenseId,
	ImagesCleanedUp,
	UpdatedAt,
}

#[derive(DeriveIden)]
enum Pages {
	Table,
	Id,
	ReceiptId,
	SortOrder,
	FileName,
	FileSize,
	Kind,
	RemotePath,
}
