//! Ephemera - an ephemeral in-memory store for challenge answers
//!
//! A verification layer issues a challenge, stores the expected answer here
//! under an opaque id, and later confirms the caller's response with a
//! single consuming read. Entries live for a configured duration; a
//! background sweep evicts answers that were never read.
//!
//! # Example
//!
//! ```rust,no_run
//! use ephemera::{MemoryStore, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StoreConfig {
//!         expiration: Duration::from_secs(300),
//!         sweep_interval: Duration::from_secs(30),
//!     };
//!     let store = MemoryStore::with_config(config)?;
//!
//!     store.set("challenge-1", "712934");
//!
//!     // Confirming a response consumes the answer
//!     let answer = store.get("challenge-1", true)?;
//!     assert_eq!(answer, "712934");
//!
//!     store.shutdown();
//!     Ok(())
//! }
//! ```

pub mod store;

/// Re-export commonly used types
pub use store::{Entry, MemoryStore, Store, StoreConfig, StoreError};
