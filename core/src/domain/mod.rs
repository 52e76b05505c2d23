//! Domain types for the receipt sync engine
//!
//! Pure data, no I/O. The storage and wire representations of these types
//! live at their respective boundaries (`infrastructure::database`,
//! `cloud::api`).

pub mod page;
pub mod receipt;
pub mod status;

pub use page::{Page, PageKind};
pub use receipt::{EnhancementMode, Receipt, TripRef};
pub use status::{ServerStatus, SyncStatus};
