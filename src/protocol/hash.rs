//! Challenge derivation `c = H(R, Y, username)`.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::crypto::encoding::to_hex;
use crate::groups::SchnorrGroup;

/// Derives the challenge scalar binding a commitment to a public key and a
/// claimed identity.
///
/// The digest input is the concatenation `hex(R) || hex(Y) || utf8(username)`
/// where `hex` is the lowercase no-leading-zero encoding of
/// [`encoding::to_hex`](crate::crypto::encoding::to_hex). The textual form is
/// load-bearing: clients hash the same strings, and a raw-byte or fixed-width
/// encoding would diverge silently. The 32-byte digest is read as a
/// big-endian unsigned integer and reduced modulo `q`.
pub fn challenge_scalar(
    group: &SchnorrGroup,
    commitment: &BigUint,
    public_y: &BigUint,
    username: &str,
) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(to_hex(commitment).as_bytes());
    hasher.update(to_hex(public_y).as_bytes());
    hasher.update(username.as_bytes());
    group.scalar_reduce(&BigUint::from_bytes_be(&hasher.finalize()))
}
