//! SeaORM entities for the local record store

pub mod page;
pub mod receipt;
