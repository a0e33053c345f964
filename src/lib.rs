// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod bootstrap;
pub mod compose;
pub mod config;
pub mod feed;
pub mod filter;
pub mod http;
pub mod image;
pub mod notify;
pub mod orchestrator;
pub mod scheduler;
pub mod selector;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::orchestrator::{Orchestrator, RunOutcome};
pub use crate::store::{DedupStore, KeyStore};
