//! Page entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pages")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	pub receipt_id: Uuid,
	pub sort_order: i32,
	pub file_name: String,
	pub file_size: i64,
	pub kind: String,
	pub remote_path: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::receipt::Entity",
		from = "Column::ReceiptId",
		to = "super::receipt::Column::Id"
	)]
	Receipt,
}

impl Related<super::receipt::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Receipt.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
