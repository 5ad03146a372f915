//! Per-transfer transport options with override merging.

use std::time::Duration;

/// Transport options for a transfer. `None` means "not set at this layer";
/// layers are merged with `merge`, later layers winning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub follow_redirects: Option<bool>,
    pub max_redirects: Option<u32>,
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl TransferOptions {
    /// Built-in defaults: follow up to 5 redirects, 30s connect and total timeouts.
    pub fn defaults() -> Self {
        Self {
            follow_redirects: Some(true),
            max_redirects: Some(5),
            connect_timeout: Some(Duration::from_secs(30)),
            timeout: Some(Duration::from_secs(30)),
            user_agent: None,
        }
    }

    /// Overwrites every field that `other` sets.
    pub fn merge(&mut self, other: &TransferOptions) {
        if other.follow_redirects.is_some() {
            self.follow_redirects = other.follow_redirects;
        }
        if other.max_redirects.is_some() {
            self.max_redirects = other.max_redirects;
        }
        if other.connect_timeout.is_some() {
            self.connect_timeout = other.connect_timeout;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.user_agent.is_some() {
            self.user_agent = other.user_agent.clone();
        }
    }

    /// Returns `base` with `self` merged on top.
    pub fn merged_over(&self, base: &TransferOptions) -> TransferOptions {
        let mut merged = base.clone();
        merged.merge(self);
        merged
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
