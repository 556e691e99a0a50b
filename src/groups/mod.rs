/// RFC 3526 1536-bit MODP group and its validity predicates.
pub mod rfc3526;

pub use rfc3526::SchnorrGroup;
