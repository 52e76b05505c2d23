//! Shoebox core
//!
//! Offline-first receipt sync engine embedded by the mobile shells. Capture
//! happens offline; this crate owns the local record store, the upload
//! queue and its state machine, crash recovery, review-status
//! reconciliation and storage retention. Platform concerns (camera, UI,
//! auth flows, connectivity monitoring) stay in the shells and reach the
//! engine through the traits in [`cloud`] and the [`SyncManager`] surface.

pub mod cloud;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod operations;
pub mod sync;

pub use config::EngineConfig;
pub use domain::{EnhancementMode, Page, PageKind, Receipt, ServerStatus, SyncStatus, TripRef};
pub use infrastructure::blob::BlobStorage;
pub use infrastructure::database::{Database, ReceiptStore};
pub use sync::{QueueOverview, SyncError, SyncManager, SyncSettings};
