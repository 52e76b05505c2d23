//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;
pub mod store;

pub use store::{ReceiptStore, StoreError};

/// Database wrapper for the local record store.
pub struct Database {
	conn: DatabaseConnection,
}

impl Database {
	/// Create or open the database at the specified path.
	pub async fn create(path: &Path) -> Result<Self, DbErr> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {}", e)))?;
		}

		let db_url = format!("sqlite://{}?mode=rwc", path.display());

		let mut opt = ConnectOptions::new(db_url);
		opt.max_connections(10)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.idle_timeout(Duration::from_secs(8))
			.sqlx_logging(false); // We'll use tracing instead

		let conn = SeaDatabase::connect(opt).await?;

		info!("Opened database at {:?}", path);

		Ok(Self { conn })
	}

	/// In-memory database for tests. Pinned to a single connection: every
	/// pooled sqlite connection would otherwise get its own empty database.
	pub async fn create_in_memory() -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new("sqlite::memory:");
		opt.max_connections(1).min_connections(1).sqlx_logging(false);

		let conn = SeaDatabase::connect(opt).await?;

		Ok(Self { conn })
	}

	/// Run migrations.
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed");
		Ok(())
	}

	/// Get the database connection.
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}

	/// Consume the wrapper, keeping the connection.
	pub fn into_conn(self) -> DatabaseConnection {
		self.conn
	}
}
