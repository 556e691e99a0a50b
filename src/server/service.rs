//! Authentication facade.
//!
//! Accepts the three wire requests, enforces input validation, consults the
//! user directory, drives the protocol engine, and emits audit events and
//! bearer tokens. All rejection reasons are internal; callers of this module
//! map every authentication failure to one uniform response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crypto::encoding::{from_hex, to_hex};
use crate::crypto::SecureRng;
use crate::directory::{UserDirectory, UserRecord};
use crate::events::{AuthEvent, EventPublisher};
use crate::groups::SchnorrGroup;
use crate::protocol::ProtocolEngine;
use crate::server::cpu::CpuPool;
use crate::store::ChallengeStore;
use crate::token::{BearerToken, TokenIssuer};
use crate::{Error, Result};

/// Registration request body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Requested username.
    pub username: String,
    /// Public element `Y` as hex.
    pub public_key_y: String,
    /// Opaque client-side salt as hex.
    pub salt: String,
}

/// Challenge request body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Claimed username.
    pub username: String,
    /// Client commitment `R` as hex.
    pub client_r: String,
}

/// Challenge response body. All big integers are lowercase hex.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// Opaque session identifier.
    pub challenge_id: String,
    /// Challenge scalar `c`.
    pub c: String,
    /// Group modulus `p`.
    pub p: String,
    /// Subgroup order `q`.
    pub q: String,
    /// Generator `g`.
    pub g: String,
}

/// Verify request body.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Session identifier from the challenge response.
    pub challenge_id: String,
    /// Proof response `s` as hex.
    pub s: String,
    /// Echo of the commitment `R` as hex.
    pub client_r: String,
    /// Claimed username.
    pub username: String,
}

/// The authentication facade wiring the engine to its collaborators.
pub struct AuthService {
    group: Arc<SchnorrGroup>,
    engine: Arc<ProtocolEngine>,
    store: Arc<dyn ChallengeStore>,
    directory: Arc<dyn UserDirectory>,
    events: Arc<dyn EventPublisher>,
    tokens: Arc<dyn TokenIssuer>,
    pool: CpuPool,
}

impl AuthService {
    /// Wires a facade over the given collaborators.
    pub fn new(
        group: Arc<SchnorrGroup>,
        store: Arc<dyn ChallengeStore>,
        directory: Arc<dyn UserDirectory>,
        events: Arc<dyn EventPublisher>,
        tokens: Arc<dyn TokenIssuer>,
        pool: CpuPool,
        challenge_ttl: Duration,
    ) -> Self {
        let engine = Arc::new(ProtocolEngine::new(
            Arc::clone(&group),
            Arc::clone(&store),
            pool.clone(),
            challenge_ttl,
        ));
        Self {
            group,
            engine,
            store,
            directory,
            events,
            tokens,
            pool,
        }
    }

    /// The group parameters this service operates over.
    pub fn group(&self) -> &Arc<SchnorrGroup> {
        &self.group
    }

    /// Registers a new user.
    pub async fn register(&self, req: &RegisterRequest) -> Result<()> {
        let start = Instant::now();
        counter!("auth.register.requests").increment(1);

        let result = self.register_inner(req).await;

        histogram!("auth.register.duration").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(()) => counter!("auth.register.success").increment(1),
            Err(err) => {
                counter!("auth.register.failure", "reason" => err.reason_code()).increment(1)
            }
        }
        result
    }

    async fn register_inner(&self, req: &RegisterRequest) -> Result<()> {
        validate_username(&req.username)?;
        let y = from_hex(&req.public_key_y)?;
        from_hex(&req.salt)?;

        let p_minus_one = self.group.p() - BigUint::one();
        if y <= BigUint::one() || y >= p_minus_one {
            return Err(Error::InvalidArgument(
                "public key out of range".to_string(),
            ));
        }

        // Range checks alone admit the order-2 element; the subgroup test
        // closes that at registration cost (one exponentiation, offloaded).
        let in_subgroup = {
            let group = Arc::clone(&self.group);
            let y = y.clone();
            self.pool.run(move || group.is_subgroup_member(&y)).await?
        };
        if !in_subgroup {
            return Err(Error::InvalidArgument(
                "public key outside the prime-order subgroup".to_string(),
            ));
        }

        self.directory
            .insert(UserRecord::new(&req.username, &to_hex(&y), &req.salt))
            .await?;

        debug!(username = %req.username, "user registered");
        self.publish(AuthEvent::user_registered(&req.username)).await;
        Ok(())
    }

    /// Issues a challenge for a claimed username.
    ///
    /// Unknown usernames follow the identical path with a synthesised decoy
    /// public key, so the response shape and timing do not reveal whether an
    /// account exists. The decoy is never persisted or logged; verifying
    /// against its challenge later fails at the directory lookup.
    pub async fn challenge(&self, req: &ChallengeRequest) -> Result<ChallengeResponse> {
        let start = Instant::now();
        counter!("auth.challenge.requests").increment(1);

        let result = self.challenge_inner(req).await;

        histogram!("auth.challenge.duration").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => counter!("auth.challenge.success").increment(1),
            Err(err) => {
                counter!("auth.challenge.failure", "reason" => err.reason_code()).increment(1)
            }
        }
        result
    }

    async fn challenge_inner(&self, req: &ChallengeRequest) -> Result<ChallengeResponse> {
        validate_username(&req.username)?;
        let client_r = from_hex(&req.client_r)?;

        let public_y = match self.directory.find_by_username(&req.username).await? {
            Some(user) => from_hex(&user.public_key_y)?,
            None => {
                let group = Arc::clone(&self.group);
                self.pool
                    .run(move || SecureRng::new().random_decoy_element(&group))
                    .await?
            }
        };

        let issued = self
            .engine
            .issue_challenge(&req.username, &client_r, &public_y)
            .await?;

        Ok(ChallengeResponse {
            challenge_id: issued.challenge_id,
            c: to_hex(&issued.challenge),
            p: to_hex(self.group.p()),
            q: to_hex(self.group.q()),
            g: to_hex(self.group.g()),
        })
    }

    /// Verifies a proof and mints a bearer token.
    pub async fn verify(&self, req: &VerifyRequest) -> Result<BearerToken> {
        let start = Instant::now();
        counter!("auth.verify.requests").increment(1);

        let result = self.verify_inner(req).await;

        histogram!("auth.verify.duration").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => counter!("auth.verify.success").increment(1),
            Err(err) => counter!("auth.verify.failure", "reason" => err.reason_code()).increment(1),
        }
        result
    }

    async fn verify_inner(&self, req: &VerifyRequest) -> Result<BearerToken> {
        validate_username(&req.username)?;
        if req.challenge_id.is_empty() || req.challenge_id.len() > 64 {
            return Err(Error::InvalidArgument(
                "challenge identifier out of range".to_string(),
            ));
        }
        let s = from_hex(&req.s)?;
        let client_r = from_hex(&req.client_r)?;

        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        let directory = Arc::clone(&self.directory);
        let challenge_id = req.challenge_id.clone();
        let claimed_username = req.username.clone();

        // Runs as its own task: once the challenge has been loaded it must
        // be consumed even if the client disconnects mid-verify. The record
        // is loaded here exactly once and handed to the engine.
        let outcome = tokio::spawn(async move {
            let record = store
                .get(&challenge_id)
                .await?
                .ok_or(Error::SessionNotFound)?;

            let user = directory.find_by_username(&record.username).await?;
            let Some(user) = user else {
                // Challenge issued against a decoy key; the session is
                // unauthenticatable and must still be consumed.
                if let Err(err) = store.delete(&challenge_id).await {
                    warn!(challenge_id = %challenge_id, error = %err, "failed to consume challenge");
                }
                return Err(Error::SessionNotFound);
            };
            let public_y = from_hex(&user.public_key_y)?;

            engine
                .verify_proof(
                    &challenge_id,
                    record,
                    &s,
                    &client_r,
                    &claimed_username,
                    &public_y,
                )
                .await
        })
        .await
        .map_err(|e| Error::DependencyUnavailable(format!("verification task failed: {e}")))?;

        match outcome {
            Ok(()) => {
                debug!(username = %req.username, "proof accepted");
                self.publish(AuthEvent::login_success(&req.username)).await;
                self.touch_last_login(&req.username);
                self.tokens.issue(&req.username).await
            }
            Err(err) if err.is_auth_failure() => {
                self.publish(AuthEvent::login_failed(&req.username, err.reason_code()))
                    .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Best-effort asynchronous `last_login_at` update; failures are logged,
    /// never propagated.
    fn touch_last_login(&self, username: &str) {
        let directory = Arc::clone(&self.directory);
        let username = username.to_string();
        tokio::spawn(async move {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_else(|_| unreachable!("System time is after UNIX_EPOCH"))
                .as_secs();
            if let Err(err) = directory.update_last_login(&username, now).await {
                warn!(username = %username, error = %err, "failed to update last login time");
            }
        });
    }

    async fn publish(&self, event: AuthEvent) {
        if let Err(err) = self.events.publish(event).await {
            warn!(error = %err, "failed to publish audit event");
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    let valid = (3..=32).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid {
        return Err(Error::InvalidArgument(
            "username must be 3-32 characters of [A-Za-z0-9_]".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingEventPublisher;
    use crate::protocol::{Commitment, Keypair};
    use crate::store::{MemoryChallengeStore, CHALLENGE_TTL};
    use crate::token::RandomTokenIssuer;

    fn service() -> (AuthService, Arc<RecordingEventPublisher>) {
        let events = Arc::new(RecordingEventPublisher::new());
        let service = AuthService::new(
            Arc::new(SchnorrGroup::rfc3526_1536()),
            Arc::new(MemoryChallengeStore::new()),
            Arc::new(crate::directory::MemoryUserDirectory::new()),
            events.clone(),
            Arc::new(RandomTokenIssuer::default()),
            CpuPool::new(2, 64),
            CHALLENGE_TTL,
        );
        (service, events)
    }

    fn register_request(username: &str, public_key_y: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            public_key_y: public_key_y.to_string(),
            salt: "a1b2c3d4".to_string(),
        }
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("al_1ce_99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("bad-name").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("naïve").is_err());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (service, _) = service();
        service.register(&register_request("alice", "80")).await.unwrap();
        let err = service
            .register(&register_request("alice", "800"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict));
    }

    #[tokio::test]
    async fn register_rejects_out_of_range_keys() {
        let (service, _) = service();
        let group = SchnorrGroup::rfc3526_1536();
        let p_minus_one = to_hex(&(group.p() - BigUint::one()));

        let p_hex = to_hex(group.p());
        for bad in ["0", "1", p_minus_one.as_str(), p_hex.as_str()] {
            let err = service
                .register(&register_request("alice", bad))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "key {bad}");
        }
    }

    #[tokio::test]
    async fn register_rejects_non_subgroup_keys() {
        let (service, _) = service();
        let group = SchnorrGroup::rfc3526_1536();
        // -128 mod p: in range, but a non-residue and so outside the
        // order-q subgroup.
        let outside = group.mod_mul(&(group.p() - BigUint::one()), &BigUint::from(128u32));
        assert!(!group.is_subgroup_member(&outside));

        let err = service
            .register(&register_request("alice", &to_hex(&outside)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_user_gets_well_formed_challenge() {
        let (service, _) = service();
        let group = SchnorrGroup::rfc3526_1536();
        let mut rng = SecureRng::new();
        let commitment = Commitment::generate(&group, &mut rng);

        let response = service
            .challenge(&ChallengeRequest {
                username: "ghost_user".to_string(),
                client_r: commitment.commitment_hex(),
            })
            .await
            .unwrap();

        assert!(!response.challenge_id.is_empty());
        assert_eq!(response.g, "2");
        assert_eq!(response.p, to_hex(group.p()));
        assert!(from_hex(&response.c).unwrap() < *group.q());
    }

    #[tokio::test]
    async fn full_flow_emits_events() {
        let (service, events) = service();
        let group = SchnorrGroup::rfc3526_1536();
        let mut rng = SecureRng::new();

        let keypair = Keypair::generate(&group, &mut rng);
        service
            .register(&register_request("alice", &keypair.public_hex()))
            .await
            .unwrap();

        let commitment = Commitment::generate(&group, &mut rng);
        let challenge = service
            .challenge(&ChallengeRequest {
                username: "alice".to_string(),
                client_r: commitment.commitment_hex(),
            })
            .await
            .unwrap();

        let c = from_hex(&challenge.c).unwrap();
        let s = keypair.respond(&group, &commitment, &c);
        let token = service
            .verify(&VerifyRequest {
                challenge_id: challenge.challenge_id,
                s: to_hex(&s),
                client_r: commitment.commitment_hex(),
                username: "alice".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(token.username, "alice");
        let events = events.events().await;
        assert!(matches!(events[0], AuthEvent::UserRegistered { .. }));
        assert!(matches!(events[1], AuthEvent::LoginSuccess { .. }));
    }
}
