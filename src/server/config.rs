use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitSettings,
    /// Metrics exporter configuration.
    pub metrics: MetricsSettings,
    /// Challenge store configuration.
    pub challenge: ChallengeSettings,
    /// CPU worker pool configuration.
    pub cpu: CpuPoolSettings,
    /// Token issuance configuration.
    pub token: TokenSettings,
}

impl ServerConfig {
    /// Converts host and port into a socket address.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address, which only happens if the configuration is malformed.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid server address configuration (host: {}, port: {}): {}",
                    self.host, self.port, e
                )
            })
    }
}

/// Rate limiting settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Sustained request budget per minute.
    pub requests_per_minute: u64,
    /// Extra back-to-back requests tolerated beyond the sustained pace.
    pub burst: u64,
}

impl RateLimitSettings {
    /// Builds the throttle these settings describe.
    pub fn build_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.requests_per_minute, self.burst)
    }
}

/// Request throttle on a virtual schedule.
///
/// The only state is the timestamp of the next free slot. Every admitted
/// request pushes it forward by one emission interval (a minute divided by
/// the sustained budget); a request is refused once the slot has run further
/// ahead of the clock than the burst allowance. Clones share the schedule.
#[derive(Clone)]
pub struct RateLimiter {
    next_slot: Arc<Mutex<Instant>>,
    interval: Duration,
    burst_allowance: Duration,
}

impl RateLimiter {
    /// Builds a throttle admitting `requests_per_minute` sustained and up to
    /// `burst` requests back to back.
    pub fn new(requests_per_minute: u64, burst: u64) -> Self {
        let interval = Duration::from_secs_f64(60.0 / requests_per_minute.max(1) as f64);
        let burst_allowance = interval.mul_f64(burst.max(1).saturating_sub(1) as f64);
        Self {
            next_slot: Arc::new(Mutex::new(Instant::now())),
            interval,
            burst_allowance,
        }
    }

    /// Admits or refuses one request.
    pub async fn try_acquire(&self) -> bool {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = (*next_slot).max(now);
        if slot.duration_since(now) > self.burst_allowance {
            return false;
        }
        *next_slot = slot + self.interval;
        true
    }
}

/// Metrics exporter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics export is enabled.
    pub enabled: bool,
    /// Hostname or IP address for the metrics server.
    pub host: String,
    /// Port number for the metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Converts host and port into a socket address for the metrics server.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address, which only happens if the configuration is malformed.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid metrics address configuration (host: {}, port: {}): {}",
                    self.host, self.port, e
                )
            })
    }
}

/// Challenge store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeSettings {
    /// Challenge lifetime in seconds.
    pub ttl_secs: u64,
}

/// CPU worker pool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CpuPoolSettings {
    /// Worker count; 0 means one worker per core.
    pub workers: usize,
    /// Admission queue depth before back-pressure rejects work.
    pub queue_capacity: usize,
}

/// Token issuance settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Token lifetime in seconds.
    pub expires_in_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: RateLimitSettings {
                requests_per_minute: 600,
                burst: 50,
            },
            metrics: MetricsSettings {
                enabled: false,
                host: "127.0.0.1".to_string(),
                port: 9090,
            },
            challenge: ChallengeSettings { ttl_secs: 300 },
            cpu: CpuPoolSettings {
                workers: 0,
                queue_capacity: crate::server::cpu::DEFAULT_QUEUE_CAPACITY,
            },
            token: TokenSettings {
                expires_in_secs: crate::token::DEFAULT_TOKEN_TTL_SECS,
            },
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `.env` file, TOML file, and environment
    /// variables.
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables with `SERVER_` prefix (e.g., `SERVER_PORT=8080`)
    /// 2. TOML configuration file (if it exists)
    /// 3. `.env` file (if it exists)
    /// 4. Built-in defaults
    ///
    /// The TOML file path can be set via the `SERVER_CONFIG_PATH` environment
    /// variable and defaults to `./config/server.toml`; a missing file is
    /// silently skipped.
    pub fn from_env() -> figment::error::Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        let _ = dotenvy::dotenv();

        let config_path = std::env::var("SERVER_CONFIG_PATH")
            .unwrap_or_else(|_| "config/server.toml".to_string());

        Figment::from(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::file(&config_path).nested())
            .merge(Env::prefixed("SERVER_").split("_"))
            .extract()
    }

    /// Validates the configuration for production readiness.
    ///
    /// # Errors
    /// Returns an error message if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit.requests_per_minute == 0 {
            return Err("Rate limit requests_per_minute cannot be zero".to_string());
        }
        if self.rate_limit.burst == 0 {
            return Err("Rate limit burst cannot be zero".to_string());
        }
        if self.challenge.ttl_secs == 0 {
            return Err("Challenge ttl_secs cannot be zero".to_string());
        }
        if self.cpu.queue_capacity == 0 {
            return Err("CPU pool queue_capacity cannot be zero".to_string());
        }
        if self.token.expires_in_secs == 0 {
            return Err("Token expires_in_secs cannot be zero".to_string());
        }
        Ok(())
    }
}
