//! Error types for Portal

use thiserror::Error;

use crate::ChainId;

/// Network lookup and RPC errors
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("Network {chain_id} not found in registry")]
    NotFound { chain_id: ChainId },

    #[error("Network group '{key}' not found")]
    GroupNotFound { key: String },

    #[error("No RPC endpoint configured for network {chain_id}")]
    NoRpcEndpoint { chain_id: ChainId },

    #[error("RPC call to {url} failed: {message}")]
    Rpc { url: String, message: String },

    #[error("RPC request timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Configuration integrity errors. Fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Default network group '{key}' is not configured")]
    InvalidDefaultNetwork { key: String },

    #[error("Network group '{group}' has no networks")]
    EmptyGroup { group: String },

    #[error("Network {chain_id} listed twice in group '{group}'")]
    DuplicateNetwork { group: String, chain_id: ChainId },

    #[error("Conflicting definitions for network {chain_id} ('{key}')")]
    ConflictingNetwork { chain_id: ChainId, key: String },

    #[error("Invalid L1 link for network {chain_id}: {reason}")]
    InvalidL1 { chain_id: ChainId, reason: String },

    #[error("Refresh interval of {interval_ms}ms is below the {min_ms}ms minimum")]
    InvalidRefreshInterval { interval_ms: u64, min_ms: u64 },

    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Fee estimation errors. Recoverable; surfaced as state.
#[derive(Debug, Clone, Error)]
pub enum FeeError {
    #[error("Failed to fetch gas price for network {chain_id}: {reason}")]
    GasPriceFetchFailed { chain_id: ChainId, reason: String },
}

/// Refresh scheduler errors. Isolated per subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("Refresh subscriber '{name}' failed: {message}")]
    SubscriberCallbackFailed { name: String, message: String },
}

/// Bridge selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Network {chain_id} is already the source network")]
    SameNetwork { chain_id: ChainId },

    #[error("Network {chain_id} is not part of network group '{group}'")]
    OutsideGroup { chain_id: ChainId, group: String },
}

impl NetworkError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "network_not_found",
            Self::GroupNotFound { .. } => "group_not_found",
            Self::NoRpcEndpoint { .. } => "no_rpc_endpoint",
            Self::Rpc { .. } => "rpc_error",
            Self::Timeout { .. } => "rpc_timeout",
        }
    }
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDefaultNetwork { .. } => "invalid_default_network",
            Self::EmptyGroup { .. } => "empty_group",
            Self::DuplicateNetwork { .. } => "duplicate_network",
            Self::ConflictingNetwork { .. } => "conflicting_network",
            Self::InvalidL1 { .. } => "invalid_l1",
            Self::InvalidRefreshInterval { .. } => "invalid_refresh_interval",
            Self::Io(_) => "config_io",
            Self::Parse(_) => "config_parse",
        }
    }
}

impl FeeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::GasPriceFetchFailed { .. } => "gas_price_fetch_failed",
        }
    }
}

impl RefreshError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SubscriberCallbackFailed { .. } => "subscriber_callback_failed",
        }
    }
}

impl SelectionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SameNetwork { .. } => "same_network",
            Self::OutsideGroup { .. } => "outside_group",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = NetworkError::NotFound { chain_id: 42 };
        assert_eq!(err.error_code(), "network_not_found");
        assert_eq!(err.to_string(), "Network 42 not found in registry");

        let err = ConfigError::InvalidDefaultNetwork {
            key: "devnet".into(),
        };
        assert_eq!(err.error_code(), "invalid_default_network");

        let err = FeeError::GasPriceFetchFailed {
            chain_id: 1,
            reason: "timeout".into(),
        };
        assert_eq!(err.error_code(), "gas_price_fetch_failed");
    }

    #[test]
    fn test_selection_error_codes() {
        let err = SelectionError::OutsideGroup {
            chain_id: 300,
            group: "mainnet".into(),
        };
        assert_eq!(err.error_code(), "outside_group");
        assert_eq!(
            err.to_string(),
            "Network 300 is not part of network group 'mainnet'"
        );
    }
}
