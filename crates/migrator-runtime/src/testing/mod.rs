//! Test support: executors that need no database.

mod mock;

pub use mock::{CatalogExecutor, ScriptedExecutor};
