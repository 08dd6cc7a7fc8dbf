//! Service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/techdesk/portal.json";

/// TechDesk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Listen address for the portal
    pub bind_addr: String,
    /// Token settings
    pub auth: AuthConfig,
    /// Online/offline derivation
    pub presence: PresenceConfig,
    /// Live notification delivery
    pub notifications: NotificationConfig,
    /// Admin account created at startup if missing
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            auth: AuthConfig::default(),
            presence: PresenceConfig::default(),
            notifications: NotificationConfig::default(),
            bootstrap_admin: None,
        }
    }
}

impl DeskConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(addr) = std::env::var("TECHDESK_BIND") {
            self.bind_addr = addr;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        self
    }
}

/// JWT settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "techdesk-dev-secret-change-in-production".into(),
            issuer: "techdesk".into(),
            access_ttl_secs: 24 * 60 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Presence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub online_window_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { online_window_secs: 10 * 60 }
    }
}

impl PresenceConfig {
    pub fn online_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.online_window_secs as i64)
    }
}

/// Notification delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Per-connection send timeout
    pub send_timeout_ms: u64,
    /// Pending notifications before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 2_000,
            queue_capacity: 1_024,
        }
    }
}

impl NotificationConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Seed administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}
