//! Entry structure for stored answers

use std::time::{Duration, Instant};

/// Represents a single stored answer
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored answer
    pub value: String,

    /// Absolute expiration time
    pub expires_at: Instant,
}

impl Entry {
    /// Create a new entry expiring `ttl` from now
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Entry {
            value: value.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Check if the entry has expired relative to a given instant
    ///
    /// The sweep samples the clock once per pass and checks every entry
    /// against that single instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Get remaining time to live, `None` if already expired
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}
