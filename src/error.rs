/// Error type shared by the protocol engine, the stores, and the facade.
///
/// The `SessionNotFound`, `BindingMismatch`, and `ProofInvalid` variants form
/// the internal rejection taxonomy for authentication attempts. They collapse
/// to a single generic unauthorized response at the HTTP boundary; the
/// distinction only feeds metrics and audit events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown, expired, or already consumed challenge session.
    #[error("challenge session not found")]
    SessionNotFound,

    /// Username or commitment did not match the stored challenge.
    #[error("challenge binding mismatch: {0}")]
    BindingMismatch(&'static str),

    /// The verification equation `g^s = R * Y^c (mod p)` did not hold.
    #[error("proof verification failed")]
    ProofInvalid,

    /// The username is already registered.
    #[error("username already registered")]
    Conflict,

    /// A collaborator (challenge store, user directory, event bus, token
    /// issuer, CPU pool) failed or refused work.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl Error {
    /// True for rejections that must surface as the uniform unauthorized
    /// response.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::SessionNotFound | Error::BindingMismatch(_) | Error::ProofInvalid
        )
    }

    /// Short stable code for metrics and audit events. Never sent to clients.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::SessionNotFound => "session_not_found",
            Error::BindingMismatch(_) => "binding_mismatch",
            Error::ProofInvalid => "proof_invalid",
            Error::Conflict => "conflict",
            Error::DependencyUnavailable(_) => "dependency_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_collapse() {
        assert!(Error::SessionNotFound.is_auth_failure());
        assert!(Error::BindingMismatch("username").is_auth_failure());
        assert!(Error::ProofInvalid.is_auth_failure());
        assert!(!Error::Conflict.is_auth_failure());
        assert!(!Error::InvalidArgument("bad".to_string()).is_auth_failure());
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(Error::SessionNotFound.reason_code(), "session_not_found");
        assert_eq!(Error::ProofInvalid.reason_code(), "proof_invalid");
    }
}
