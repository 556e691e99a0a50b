//! Audit event stream.
//!
//! Register and login outcomes are published as JSON objects on the
//! `auth-events` topic. The broker is an external collaborator; the default
//! publisher emits the serialized event through the log stream, and tests
//! use the recording publisher. Publication is best-effort everywhere: the
//! facade logs and swallows failures.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{Error, Result};

/// Topic the audit events are published on.
pub const AUTH_EVENTS_TOPIC: &str = "auth-events";

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_else(|_| unreachable!("System time is after UNIX_EPOCH"))
        .as_secs()
}

/// An audit event. The `reason` of a failed login is an internal code; it
/// never reaches clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "eventType")]
pub enum AuthEvent {
    /// A new user registered.
    #[serde(rename = "USER_REGISTERED")]
    UserRegistered {
        /// Registered username.
        username: String,
        /// Unix seconds.
        timestamp: u64,
    },
    /// A proof verified and a token was minted.
    #[serde(rename = "LOGIN_SUCCESS")]
    LoginSuccess {
        /// Authenticated username.
        username: String,
        /// Unix seconds.
        timestamp: u64,
    },
    /// An authentication attempt was rejected.
    #[serde(rename = "LOGIN_FAILED")]
    LoginFailed {
        /// Claimed username.
        username: String,
        /// Internal reason code.
        reason: String,
        /// Unix seconds.
        timestamp: u64,
    },
}

impl AuthEvent {
    /// Registration event stamped with the current time.
    pub fn user_registered(username: &str) -> Self {
        Self::UserRegistered {
            username: username.to_string(),
            timestamp: unix_now(),
        }
    }

    /// Successful login event stamped with the current time.
    pub fn login_success(username: &str) -> Self {
        Self::LoginSuccess {
            username: username.to_string(),
            timestamp: unix_now(),
        }
    }

    /// Failed login event stamped with the current time.
    pub fn login_failed(username: &str, reason: &str) -> Self {
        Self::LoginFailed {
            username: username.to_string(),
            reason: reason.to_string(),
            timestamp: unix_now(),
        }
    }
}

/// Sink for audit events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: AuthEvent) -> Result<()>;
}

/// Publisher that emits events as structured log lines.
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: AuthEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| Error::DependencyUnavailable(format!("event serialization: {e}")))?;
        tracing::info!(target: "auth_events", topic = AUTH_EVENTS_TOPIC, %payload, "audit event");
        Ok(())
    }
}

/// Publisher that retains events in memory for assertions.
pub struct RecordingEventPublisher {
    events: Mutex<Vec<AuthEvent>>,
}

impl RecordingEventPublisher {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything published so far.
    pub async fn events(&self) -> Vec<AuthEvent> {
        let events = self.events.lock().await;
        events.clone()
    }
}

impl Default for RecordingEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: AuthEvent) -> Result<()> {
        let mut events = self.events.lock().await;
        events.push(event);
        Ok(())
    }
}
