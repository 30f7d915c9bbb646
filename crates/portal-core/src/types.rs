//! Core type definitions for Portal

use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM chain identifier
pub type ChainId = u64;

/// Token amount in the token's smallest unit (wei for ETH)
pub type Amount = u128;

/// EVM address (20 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that this is `0x` followed by exactly 40 hex characters
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix("0x") {
            Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
            None => false,
        }
    }

    /// Compare two addresses ignoring checksum casing
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Lowercased form, used as a lookup key
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native currency of a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn ether() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Block explorer endpoints for a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
    pub api_url: String,
}

/// A network known to the bridge.
///
/// `l1_network` is `None` for an L1 (a root). Networks listed as members of a
/// group may omit it; the registry fills it in from the group's L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: ChainId,
    /// Slug in `{network name}-{env}` form, e.g. `ethereum-mainnet`
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer: Option<BlockExplorer>,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub l1_network: Option<ChainId>,
    #[serde(default)]
    pub testnet: bool,
    /// Only the native token can be bridged to this network (Gateway)
    #[serde(default)]
    pub native_token_bridging_only: bool,
}

impl Network {
    pub fn is_l1(&self) -> bool {
        self.l1_network.is_none()
    }
}

/// Layer of a network in the rollup ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    L1,
    L2,
    Gateway,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::Gateway => "Gateway",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of bridge transfer between two networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Deposit,
    Withdraw,
    Interop,
    Gateway,
    /// The pair cannot be bridged (or a side is unselected)
    None,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Interop => "interop",
            Self::Gateway => "gateway",
            Self::None => "none",
        }
    }

    pub fn is_bridgeable(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Transfers that move funds towards or across L2s, paid on the source side
    pub fn is_deposit_like(&self) -> bool {
        matches!(self, Self::Deposit | Self::Interop | Self::Gateway)
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token as listed by the block explorer, optionally enriched with the
/// connected account's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub l1_address: Address,
    pub l2_address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default)]
    pub usd_price: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<f64>,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Listed in the synthetic L1 token group
    #[serde(default)]
    pub l1_token: bool,
    /// Balance of the connected account, smallest unit
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub usd_balance: Option<f64>,
    /// Native asset of the network it is listed on
    #[serde(default)]
    pub native: bool,
}

impl Token {
    /// Balance if known and non-zero
    pub fn balance(&self) -> Option<Amount> {
        self.amount.filter(|a| *a > 0)
    }
}

/// Constants
pub mod constants {
    /// Placeholder address of ETH on L1
    pub const L1_ETH_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

    /// Address of the base token system contract on ZKsync L2s
    pub const L2_BASE_TOKEN_ADDRESS: &str = "0x000000000000000000000000000000000000800A";

    /// Decimals of ETH and of every chain base token we bridge
    pub const BASE_TOKEN_DECIMALS: u8 = 18;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_well_formed() {
        assert!(Address::new(constants::L1_ETH_ADDRESS).is_well_formed());
        assert!(Address::new("0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_well_formed());
        assert!(!Address::new("742d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_well_formed());
        assert!(!Address::new("0x742d35").is_well_formed());
        assert!(!Address::new("0xZZ2d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_well_formed());
    }

    #[test]
    fn test_address_matches_ignores_case() {
        let base = Address::new(constants::L2_BASE_TOKEN_ADDRESS);
        assert!(base.matches("0x000000000000000000000000000000000000800a"));
        assert!(!base.matches(constants::L1_ETH_ADDRESS));
    }

    #[test]
    fn test_transfer_type_serialization() {
        let json = serde_json::to_string(&TransferType::Withdraw).unwrap();
        assert_eq!(json, "\"withdraw\"");
        let parsed: TransferType = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(parsed, TransferType::None);
        assert!(!parsed.is_bridgeable());
    }

    #[test]
    fn test_token_balance_ignores_zero() {
        let mut token = Token {
            l1_address: Address::new(constants::L1_ETH_ADDRESS),
            l2_address: Address::new(constants::L2_BASE_TOKEN_ADDRESS),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            usd_price: None,
            liquidity: None,
            icon_url: None,
            l1_token: false,
            amount: Some(0),
            usd_balance: None,
            native: true,
        };
        assert_eq!(token.balance(), None);
        token.amount = Some(5);
        assert_eq!(token.balance(), Some(5));
    }
}
