/// Wire encoding of big integers as lowercase hexadecimal text.
pub mod encoding;
/// Cryptographically secure randomness for scalars, decoys, and tokens.
pub mod rng;

pub use rng::SecureRng;
