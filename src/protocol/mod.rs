/// Protocol engine orchestrating challenge issuance and proof verification.
pub mod engine;
/// Challenge derivation hash binding commitment, public key, and identity.
pub mod hash;
/// Client-side prover (key pairs, commitments, responses).
pub mod prover;

pub use engine::{Challenge, ProtocolEngine};
pub use prover::{Commitment, Keypair};
