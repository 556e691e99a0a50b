//! Read-mostly user directory.
//!
//! The persistent directory is an external collaborator; the core only
//! depends on the lookup/insert/touch contract below. An in-memory
//! implementation is provided for single-process deployments and tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::Result;

/// In-process user directory.
pub mod memory;

pub use memory::MemoryUserDirectory;

/// A registered user.
///
/// `public_key_y` is the lowercase hex of `Y = g^x mod p`; the private
/// scalar `x` never reaches the server. `salt` is opaque user-controlled
/// metadata, stored and returned but never fed into the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable identifier.
    pub id: String,
    /// Unique username.
    pub username: String,
    /// Public element `Y` as lowercase hex.
    pub public_key_y: String,
    /// Opaque client-supplied blob.
    pub salt: String,
    /// Unix seconds of the last successful login, if any.
    pub last_login_at: Option<u64>,
    /// Unix seconds of registration.
    pub created_at: u64,
    /// Unix seconds of the last mutation.
    pub updated_at: u64,
}

impl UserRecord {
    /// Creates a record for a new registration, stamping identifiers and
    /// timestamps.
    pub fn new(username: &str, public_key_y: &str, salt: &str) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_else(|_| unreachable!("System time is after UNIX_EPOCH"))
            .as_secs();
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            public_key_y: public_key_y.to_string(),
            salt: salt.to_string(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lookup of `Y` by username plus the single write the core performs.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetches a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Persists a new user. Fails with [`Error::Conflict`](crate::Error) if
    /// the username exists.
    async fn insert(&self, record: UserRecord) -> Result<()>;

    /// Records a successful login. A missing user is not an error; the
    /// update is best-effort by contract.
    async fn update_last_login(&self, username: &str, at: u64) -> Result<()>;
}
