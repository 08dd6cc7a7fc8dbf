//! Request and response shapes local to the HTTP surface

use serde::{Deserialize, Serialize};
use techdesk_core::{DeskError, Period};

/// `?period=hour|day|month`
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    pub fn parse(&self) -> Result<Option<Period>, DeskError> {
        match self.period.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

/// WebSocket handshake; browsers cannot set headers on upgrade
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub live_connections: usize,
}
