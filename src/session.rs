//! Shared-password admin mode.
//!
//! The gate owns the current token and at most one pending intent: the mutating action a
//! user attempted while logged out. A successful login hands that intent back once so the
//! caller can resume it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_SESSION_DURATION_MS: i64 = 3_600_000;
const DEFAULT_PASSWORDS: [&str; 3] = ["admin2025", "talaga123", "manchester2025"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub admin_passwords: Vec<String>,
    pub session_duration_ms: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_passwords: DEFAULT_PASSWORDS.iter().map(|p| p.to_string()).collect(),
            session_duration_ms: DEFAULT_SESSION_DURATION_MS,
        }
    }
}

/// Decode `{ "admin_passwords": [...], "session_duration": ms }`. Absent or unusable
/// fields keep their defaults.
pub fn parse_auth_config_json(raw: &str) -> Result<AuthConfig> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid auth config json")?;
    let mut config = AuthConfig::default();
    let passwords: Vec<String> = v
        .get("admin_passwords")
        .and_then(|p| p.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| p.as_str())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if !passwords.is_empty() {
        config.admin_passwords = passwords;
    }
    if let Some(ms) = v
        .get("session_duration")
        .or_else(|| v.get("session_duration_ms"))
        .and_then(|d| d.as_i64())
        .filter(|ms| *ms > 0)
    {
        config.session_duration_ms = ms;
    }
    Ok(config)
}

/// Stored as `{ "timestamp": <ms> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(rename = "timestamp")]
    pub issued_at_ms: i64,
}

impl SessionToken {
    pub fn is_valid(&self, now_ms: i64, duration_ms: i64) -> bool {
        now_ms - self.issued_at_ms < duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    AddResult,
    EditResult { id: i64 },
    DeleteResult { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    PromptLogin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("incorrect password")]
    WrongPassword,
}

#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    config: AuthConfig,
    token: Option<SessionToken>,
    pending: Option<GatedAction>,
}

impl SessionGate {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            token: None,
            pending: None,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AuthConfig) {
        self.config = config;
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.token
    }

    pub fn pending(&self) -> Option<GatedAction> {
        self.pending
    }

    pub fn is_authenticated(&self, now_ms: i64) -> bool {
        self.token
            .is_some_and(|t| t.is_valid(now_ms, self.config.session_duration_ms))
    }

    /// Adopt a persisted token. Returns false (and stays anonymous) when it has expired.
    pub fn restore(&mut self, token: Option<SessionToken>, now_ms: i64) -> bool {
        self.token = token.filter(|t| t.is_valid(now_ms, self.config.session_duration_ms));
        self.token.is_some()
    }

    pub fn login(
        &mut self,
        password: &str,
        now_ms: i64,
    ) -> Result<Option<GatedAction>, AuthError> {
        if !self.config.admin_passwords.iter().any(|p| p == password) {
            return Err(AuthError::WrongPassword);
        }
        self.token = Some(SessionToken {
            issued_at_ms: now_ms,
        });
        Ok(self.pending.take())
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.pending = None;
    }

    /// Let `action` through, or remember it as the pending intent and ask for a login.
    pub fn check(&mut self, action: GatedAction, now_ms: i64) -> GateDecision {
        if self.is_authenticated(now_ms) {
            return GateDecision::Proceed;
        }
        self.token = None;
        self.pending = Some(action);
        GateDecision::PromptLogin
    }

    /// Forget the pending intent, e.g. when the login prompt is dismissed.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }
}
