//! Client-side prover.
//!
//! The server never holds a private scalar; this module exists for the CLI
//! client, examples, and tests that drive the protocol end to end. Secret
//! material is held as zeroizing byte buffers so it is scrubbed on drop.

use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::encoding::to_hex;
use crate::crypto::SecureRng;
use crate::groups::SchnorrGroup;
use crate::{Error, Result};

/// A secret scalar held as big-endian bytes so it can be zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar(Vec<u8>);

impl SecretScalar {
    fn from_biguint(n: &BigUint) -> Self {
        Self(n.to_bytes_be())
    }

    /// Reconstructs the scalar value. The returned `BigUint` is a working
    /// copy outside the zeroizing wrapper; keep its lifetime short.
    pub fn expose(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

/// A private scalar `x` and its public element `Y = g^x mod p`.
pub struct Keypair {
    secret: SecretScalar,
    /// The public element `Y`.
    pub public: BigUint,
}

impl Keypair {
    /// Generates a fresh key pair with `x` uniform in `[1, q-1]`.
    pub fn generate(group: &SchnorrGroup, rng: &mut SecureRng) -> Self {
        let x = rng.random_scalar(group);
        let public = group.mod_pow(group.g(), &x);
        Self {
            secret: SecretScalar::from_biguint(&x),
            public,
        }
    }

    /// Builds a key pair from an existing secret scalar.
    pub fn from_secret(group: &SchnorrGroup, x: &BigUint) -> Result<Self> {
        if x.bits() == 0 || !group.is_valid_scalar(x) {
            return Err(Error::InvalidArgument(
                "secret scalar must lie in [1, q-1]".to_string(),
            ));
        }
        Ok(Self {
            secret: SecretScalar::from_biguint(x),
            public: group.mod_pow(group.g(), x),
        })
    }

    /// The public element as wire hex.
    pub fn public_hex(&self) -> String {
        to_hex(&self.public)
    }

    /// Computes the response `s = (r + c * x) mod q` for a commitment nonce
    /// and a received challenge.
    pub fn respond(
        &self,
        group: &SchnorrGroup,
        commitment: &Commitment,
        challenge: &BigUint,
    ) -> BigUint {
        let x = self.secret.expose();
        let r = commitment.nonce.expose();
        (r + challenge * x) % group.q()
    }
}

/// A secret nonce `r` and its commitment `R = g^r mod p`.
pub struct Commitment {
    nonce: SecretScalar,
    /// The commitment element `R`.
    pub commitment: BigUint,
}

impl Commitment {
    /// Generates a fresh commitment with `r` uniform in `[1, q-1]`.
    pub fn generate(group: &SchnorrGroup, rng: &mut SecureRng) -> Self {
        let r = rng.random_scalar(group);
        let commitment = group.mod_pow(group.g(), &r);
        Self {
            nonce: SecretScalar::from_biguint(&r),
            commitment,
        }
    }

    /// Builds a commitment from an existing nonce.
    pub fn from_nonce(group: &SchnorrGroup, r: &BigUint) -> Result<Self> {
        if r.bits() == 0 || !group.is_valid_scalar(r) {
            return Err(Error::InvalidArgument(
                "nonce must lie in [1, q-1]".to_string(),
            ));
        }
        Ok(Self {
            nonce: SecretScalar::from_biguint(r),
            commitment: group.mod_pow(group.g(), r),
        })
    }

    /// The commitment element as wire hex.
    pub fn commitment_hex(&self) -> String {
        to_hex(&self.commitment)
    }
}
