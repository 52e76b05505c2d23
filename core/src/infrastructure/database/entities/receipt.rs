//! Receipt entity
//!
//! Status columns are raw strings here; the store layer converts them to
//! the domain enums and is the only place allowed to touch the raw values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	pub account_id: String,
	pub note: Option<String>,
	pub trip_id: Option<String>,
	pub trip_name: Option<String>,
	pub trip_date_label: Option<String>,
	pub captured_at: DateTimeUtc,
	pub enhancement: String,
	pub sync_status: String,
	pub last_sync_error: Option<String>,
	pub server_receipt_id: Option<String>,
	pub server_status: Option<String>,
	pub server_status_changed_at: Option<DateTimeUtc>,
	pub rejection_reason: Option<String>,
	pub expense_id: Option<String>,
	pub images_cleaned_up: bool,
	pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::page::Entity")]
	Page,
}

impl Related<super::page::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Page.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
