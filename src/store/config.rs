//! Store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a memory store
///
/// A plain value validated once at construction; there is no runtime
/// reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Time to live added to "now" on every insert (default: 10 minutes)
    pub expiration: Duration,

    /// Period between background sweep passes (default: 1 minute)
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            expiration: Duration::from_secs(10 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl StoreConfig {
    /// Check that both durations are usable
    ///
    /// A zero sweep interval would make the interval timer panic; a zero
    /// expiration would make every entry dead on arrival.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.expiration.is_zero() {
            anyhow::bail!("expiration must be greater than zero");
        }
        if self.sweep_interval.is_zero() {
            anyhow::bail!("sweep interval must be greater than zero");
        }
        Ok(())
    }
}
