//! # Schnorr Zero-Knowledge Authentication Service
//!
//! ## Overview
//!
//! An interactive authentication service in which a user proves possession
//! of a private scalar `x` without ever transmitting it. The server stores
//! only the public element `Y = g^x mod p` over the RFC 3526 1536-bit MODP
//! group and verifies Schnorr identification proofs:
//!
//! 1. The client picks a nonce `r` and sends the commitment `R = g^r mod p`.
//! 2. The server derives the challenge `c = H(R, Y, username)`, persists it
//!    under a fresh session identifier with a 300 second TTL, and returns it.
//! 3. The client answers with `s = r + c * x mod q`.
//! 4. The server accepts iff `g^s = R * Y^c (mod p)` and the session is
//!    consumed exactly once, accepted or not.
//!
//! ## Quick start
//!
//! ```rust
//! use schnorr_auth::{SchnorrGroup, SecureRng};
//! use schnorr_auth::protocol::{hash, Commitment, Keypair};
//!
//! let group = SchnorrGroup::rfc3526_1536();
//! let mut rng = SecureRng::new();
//!
//! // Client: key pair and commitment.
//! let keypair = Keypair::generate(&group, &mut rng);
//! let commitment = Commitment::generate(&group, &mut rng);
//!
//! // Server: challenge bound to (R, Y, username).
//! let c = hash::challenge_scalar(&group, &commitment.commitment, &keypair.public, "alice");
//!
//! // Client: response. Server: verification equation.
//! let s = keypair.respond(&group, &commitment, &c);
//! let lhs = group.mod_pow(group.g(), &s);
//! let rhs = group.mod_mul(&commitment.commitment, &group.mod_pow(&keypair.public, &c));
//! assert_eq!(lhs, rhs);
//! ```
//!
//! ## Security considerations
//!
//! - **One-shot sessions**: any verify attempt that finds a challenge
//!   consumes it; probing proofs against a single challenge is impossible.
//! - **Binding hash**: the challenge binds commitment, public key, and
//!   username through the wire hex encoding, so a proof for one identity
//!   cannot be replayed as another.
//! - **User enumeration**: challenges for unknown usernames are served from
//!   a random decoy key with the same response shape and timing envelope.
//! - **No secrets on the server**: private scalars and nonces exist only
//!   client-side and are zeroized on drop.
//!
//! The HTTP surface, challenge store, user directory, audit events, and
//! token issuance live under the correspondingly named modules; the server
//! binary wires them together.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::all)]

/// Randomness and wire encoding primitives.
pub mod crypto;
/// User directory contract and in-memory implementation.
pub mod directory;
/// Error types for the crate.
pub mod error;
/// Audit event stream.
pub mod events;
/// Group parameters and validity predicates.
pub mod groups;
/// Protocol implementation (engine, hash, client-side prover).
pub mod protocol;
/// HTTP server, facade, configuration, and CPU pool.
pub mod server;
/// Short-lived challenge store.
pub mod store;
/// Bearer token issuance.
pub mod token;

pub use crypto::SecureRng;
pub use error::Error;
pub use groups::SchnorrGroup;
pub use protocol::{Challenge, ProtocolEngine};

/// A specialized Result type for this crate's operations.
pub type Result<T> = core::result::Result<T, Error>;
