//! Cryptographically secure random number generator.

use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::groups::SchnorrGroup;

/// Cryptographically secure random number generator.
///
/// A thin wrapper around `OsRng` providing the protocol's sampling
/// operations on top of a consistent interface.
pub struct SecureRng(OsRng);

impl SecureRng {
    /// Creates a new cryptographically secure random number generator.
    pub fn new() -> Self {
        Self(OsRng)
    }

    /// Uniformly random scalar in `[1, q-1]`.
    pub fn random_scalar(&mut self, group: &SchnorrGroup) -> BigUint {
        loop {
            let k = self.0.gen_biguint_below(group.q());
            if !k.is_zero() {
                return k;
            }
        }
    }

    /// Uniformly random group element in `(1, p-1)`, i.e. `[2, p-2]`.
    ///
    /// Used to synthesise decoy public keys for unknown usernames. Drawn
    /// fresh from the same distribution on every call; callers must not log
    /// the result.
    pub fn random_decoy_element(&mut self, group: &SchnorrGroup) -> BigUint {
        let two = BigUint::from(2u32);
        self.0.gen_biguint_below(&(group.p() - BigUint::from(3u32))) + two
    }
}

impl Default for SecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SecureRng {}
