//! Short-lived challenge store with at-most-once consumption.

use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::crypto::encoding::{from_hex, to_hex};
use crate::{Error, Result};

/// In-process challenge store backed by a TTL map.
pub mod memory;

pub use memory::MemoryChallengeStore;

/// Key prefix for persisted challenge entries.
pub const CHALLENGE_KEY_PREFIX: &str = "zkp:challenge:";

/// Challenge lifetime from the moment of write.
pub const CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// The tuple persisted per issued challenge: the claimed identity, the
/// client's commitment `R`, and the derived challenge scalar `c`.
///
/// `c` is fixed at issue time from the `(R, Y, username)` triple; verify
/// uses the stored value and never recomputes it, so a public key rotated
/// between issue and verify cannot split the hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeRecord {
    /// Username the challenge was issued for.
    pub username: String,
    /// The client's commitment `R`.
    pub commitment: BigUint,
    /// The derived challenge scalar `c`.
    pub challenge: BigUint,
}

impl ChallengeRecord {
    /// Full store key for a challenge identifier.
    pub fn key(challenge_id: &str) -> String {
        format!("{CHALLENGE_KEY_PREFIX}{challenge_id}")
    }

    /// Serializes to the persisted `username:R_hex:c_hex` form.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.username,
            to_hex(&self.commitment),
            to_hex(&self.challenge)
        )
    }

    /// Parses the persisted `username:R_hex:c_hex` form.
    pub fn decode(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 3 {
            return Err(Error::DependencyUnavailable(
                "malformed challenge entry".to_string(),
            ));
        }
        Ok(Self {
            username: parts[0].to_string(),
            commitment: from_hex(parts[1])?,
            challenge: from_hex(parts[2])?,
        })
    }
}

/// Short-lived mapping `challengeId -> (username, R, c)`.
///
/// Entries expire `ttl` after the write and behave as absent from then on.
/// `delete` must report whether the key was present so that two concurrent
/// verifies of the same challenge cannot both complete: only the caller that
/// observes `true` is authoritative.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Persists a record under a fresh identifier with the given TTL.
    async fn put(&self, challenge_id: &str, record: &ChallengeRecord, ttl: Duration) -> Result<()>;

    /// Reads a record without consuming it. Expired entries are absent.
    async fn get(&self, challenge_id: &str) -> Result<Option<ChallengeRecord>>;

    /// Removes a record, reporting whether a live entry was present.
    async fn delete(&self, challenge_id: &str) -> Result<bool>;
}
