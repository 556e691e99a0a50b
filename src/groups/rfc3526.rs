use num_bigint::BigUint;
use num_traits::{Num, One};

/// The RFC 3526 1536-bit MODP prime, lowercase hex. This exact encoding is
/// wire-visible: challenge responses return it verbatim.
const MODP_1536_P_HEX: &str = "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74\
020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f1437\
4fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7ed\
ee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf05\
98da48361c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb\
9ed529077096966d670c354e4abc9804f1746c08ca237327ffffffffffffffff";

/// Generator of the order-`q` subgroup.
const MODP_1536_G: u32 = 2;

/// Schnorr group parameters `(p, q, g)` over a safe prime.
///
/// `p` is a safe prime with `p = 2q + 1`, `q` prime, and `g = 2` generates
/// the subgroup of order `q`. Immutable once constructed; a single instance
/// is shared process-wide behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchnorrGroup {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl SchnorrGroup {
    /// The fixed RFC 3526 1536-bit MODP group with generator 2.
    pub fn rfc3526_1536() -> Self {
        let p = BigUint::from_str_radix(MODP_1536_P_HEX, 16)
            .unwrap_or_else(|_| unreachable!("RFC 3526 prime constant is valid hex"));
        // p is a safe prime, so q = (p - 1) / 2.
        let q = (&p - BigUint::one()) >> 1;
        Self {
            p,
            q,
            g: BigUint::from(MODP_1536_G),
        }
    }

    /// The modulus `p`.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// The subgroup order `q = (p - 1) / 2`.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// The generator `g`.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// True iff `1 < x < p`. Zero and one are rejected as trivial fixed
    /// points; anything at or above `p` is not a canonical residue.
    pub fn is_valid_element(&self, x: &BigUint) -> bool {
        *x > BigUint::one() && *x < self.p
    }

    /// True iff `0 <= k < q`.
    pub fn is_valid_scalar(&self, k: &BigUint) -> bool {
        *k < self.q
    }

    /// `base^exp mod p`.
    pub fn mod_pow(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        base.modpow(exp, &self.p)
    }

    /// `a * b mod p`.
    pub fn mod_mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.p
    }

    /// `n mod q`.
    pub fn scalar_reduce(&self, n: &BigUint) -> BigUint {
        n % &self.q
    }

    /// Subgroup membership test `x^q = 1 (mod p)`.
    ///
    /// The range check in [`is_valid_element`](Self::is_valid_element) does
    /// not exclude elements of order 2; this closes that gap and is applied
    /// at registration time, where the extra exponentiation is affordable.
    pub fn is_subgroup_member(&self, x: &BigUint) -> bool {
        self.mod_pow(x, &self.q).is_one()
    }
}
