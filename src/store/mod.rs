//! Ephemeral answer storage module
//!
//! Holds short-lived challenge answers keyed by opaque ids supplied by the
//! verification layer. This module is independent of how challenges are
//! generated or delivered (loose coupling).

mod config;
mod entry;
mod error;
mod memory;

pub use config::StoreConfig;
pub use entry::Entry;
pub use error::StoreError;
pub use memory::MemoryStore;

/// Storage contract consumed by the verification layer
///
/// [`MemoryStore`] is the in-process implementation; persistent or shared
/// backends can implement the same contract and be substituted by the
/// caller.
pub trait Store: Send + Sync {
    /// Insert or replace the answer for `id`
    fn set(&self, id: &str, value: &str) -> Result<(), StoreError>;

    /// Look up the answer for `id`, removing it on success when `consume`
    /// is set
    fn get(&self, id: &str, consume: bool) -> Result<String, StoreError>;
}
