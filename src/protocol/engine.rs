//! Challenge issuance and proof verification.

use std::sync::Arc;
use std::time::Duration;

use num_bigint::BigUint;
use tracing::{debug, warn};
use uuid::Uuid;

use super::hash;
use crate::crypto::encoding::hex_prefix;
use crate::groups::SchnorrGroup;
use crate::server::cpu::CpuPool;
use crate::store::{ChallengeRecord, ChallengeStore};
use crate::{Error, Result};

/// An issued challenge, ready to be returned to the client together with the
/// group parameters.
#[derive(Clone, Debug)]
pub struct Challenge {
    /// Opaque 128-bit session identifier.
    pub challenge_id: String,
    /// The client's commitment `R`, echoed back.
    pub commitment: BigUint,
    /// The derived challenge scalar `c`.
    pub challenge: BigUint,
}

/// Orchestrates the two protocol phases against the challenge store.
///
/// Holds no per-session state of its own; every session lives in the store
/// and is consumed at most once. The 1536-bit exponentiations of the
/// verification equation run on the bounded CPU pool so a burst of verifies
/// cannot starve the I/O runtime.
pub struct ProtocolEngine {
    group: Arc<SchnorrGroup>,
    store: Arc<dyn ChallengeStore>,
    pool: CpuPool,
    ttl: Duration,
}

impl ProtocolEngine {
    /// Creates an engine over the given group, store, and CPU pool.
    pub fn new(
        group: Arc<SchnorrGroup>,
        store: Arc<dyn ChallengeStore>,
        pool: CpuPool,
        ttl: Duration,
    ) -> Self {
        Self {
            group,
            store,
            pool,
            ttl,
        }
    }

    /// Issues a challenge for a claimed identity.
    ///
    /// The client chooses `R`; the server's role is to bind it to the
    /// identity's registered (or decoy) public key via
    /// `c = H(R, Y, username)` and persist the binding under a fresh
    /// identifier. `public_y` is fixed into the hash here and never
    /// re-derived at verify time.
    pub async fn issue_challenge(
        &self,
        username: &str,
        client_r: &BigUint,
        public_y: &BigUint,
    ) -> Result<Challenge> {
        if !self.group.is_valid_element(client_r) {
            return Err(Error::InvalidArgument(
                "commitment R out of range".to_string(),
            ));
        }

        let challenge_id = Uuid::new_v4().to_string();
        let challenge = hash::challenge_scalar(&self.group, client_r, public_y, username);

        let record = ChallengeRecord {
            username: username.to_string(),
            commitment: client_r.clone(),
            challenge: challenge.clone(),
        };
        self.store.put(&challenge_id, &record, self.ttl).await?;

        debug!(
            challenge_id = %challenge_id,
            commitment = %hex_prefix(client_r),
            challenge = %hex_prefix(&challenge),
            "challenge issued"
        );

        Ok(Challenge {
            challenge_id,
            commitment: client_r.clone(),
            challenge,
        })
    }

    /// Verifies a proof against a loaded challenge and consumes the session.
    ///
    /// The caller loads the record once (it needs the stored username to
    /// re-fetch `Y`) and hands it over; the engine runs the binding checks
    /// and the equation, then settles consumption with a single atomic
    /// delete. Every attempt consumes the session, accepted or rejected, so
    /// an attacker cannot probe proofs against one challenge. For the
    /// equation path the delete happens after the verification work, and only
    /// the caller whose delete reports a live entry may complete: a lost race
    /// downgrades the outcome to [`Error::SessionNotFound`] even when the
    /// equation held.
    pub async fn verify_proof(
        &self,
        challenge_id: &str,
        record: ChallengeRecord,
        s: &BigUint,
        echoed_r: &BigUint,
        claimed_username: &str,
        public_y: &BigUint,
    ) -> Result<()> {
        if record.username != claimed_username {
            self.consume(challenge_id).await;
            return Err(Error::BindingMismatch("username"));
        }
        if record.commitment != *echoed_r {
            self.consume(challenge_id).await;
            return Err(Error::BindingMismatch("commitment"));
        }

        // Any non-negative s is accepted and reduced; negatives and
        // non-integers never parse.
        let s = self.group.scalar_reduce(s);

        let group = Arc::clone(&self.group);
        let y = public_y.clone();
        let c = record.challenge;
        let r = record.commitment;
        let valid = self
            .pool
            .run(move || {
                let lhs = group.mod_pow(group.g(), &s);
                let rhs = group.mod_mul(&r, &group.mod_pow(&y, &c));
                lhs == rhs
            })
            .await?;

        let consumed = self.store.delete(challenge_id).await?;
        if !consumed {
            // A concurrent verify (or expiry) won the consumption race.
            return Err(Error::SessionNotFound);
        }

        if valid {
            Ok(())
        } else {
            Err(Error::ProofInvalid)
        }
    }

    async fn consume(&self, challenge_id: &str) {
        if let Err(err) = self.store.delete(challenge_id).await {
            warn!(challenge_id = %challenge_id, error = %err, "failed to consume challenge after rejection");
        }
    }
}
