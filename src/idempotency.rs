//! Idempotency Keys

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::atomic::{AtomicU64, Ordering},
};

use jiff::Timestamp;
use rand::{RngCore, rngs::OsRng};
use tracing::warn;
use uuid::Builder;

static FALLBACK_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Caller-generated token that lets the cart service deduplicate retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Generate a fresh random key.
    ///
    /// Uses a random v4 UUID. If the operating system cannot provide random
    /// bytes, falls back to the current timestamp plus a process-wide sequence.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 16];

        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => Self(Builder::from_random_bytes(bytes).into_uuid().to_string()),
            Err(source) => {
                warn!("secure random unavailable, using timestamp idempotency key: {source}");

                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        let now = Timestamp::now();
        let sequence = FALLBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);

        Self(format!(
            "{}-{:08x}{:04x}",
            now.as_millisecond(),
            now.subsec_nanosecond(),
            sequence & 0xffff
        ))
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdempotencyKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for IdempotencyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
