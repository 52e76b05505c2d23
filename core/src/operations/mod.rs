//! Engine operations invoked by the shell apps

pub mod import;
