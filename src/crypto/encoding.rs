//! Hexadecimal wire encoding of unsigned big integers.
//!
//! Big integers travel as the lowercase hexadecimal of their big-endian
//! unsigned magnitude with no leading zeros, `"0"` for zero itself. The
//! challenge hash consumes this exact textual form, so the encoding is part
//! of the protocol, not a presentation detail. Decoding accepts uppercase.

use num_bigint::BigUint;
use num_traits::Num;

use crate::{Error, Result};

/// Encodes `n` as lowercase hex without leading zeros.
pub fn to_hex(n: &BigUint) -> String {
    n.to_str_radix(16)
}

/// Parses a hexadecimal unsigned integer, accepting either case.
///
/// Rejects empty input and anything outside `[0-9A-Fa-f]+` (no `0x` prefix,
/// no sign, no whitespace).
pub fn from_hex(s: &str) -> Result<BigUint> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidArgument(
            "expected a hexadecimal integer".to_string(),
        ));
    }
    BigUint::from_str_radix(s, 16)
        .map_err(|_| Error::InvalidArgument("expected a hexadecimal integer".to_string()))
}

/// Short prefix of the hex encoding, for diagnostics. Full values of `R`,
/// `Y`, and `c` stay out of the logs.
pub(crate) fn hex_prefix(n: &BigUint) -> String {
    let mut s = to_hex(n);
    s.truncate(16);
    s
}
