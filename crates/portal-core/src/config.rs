//! Configuration types for Portal

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{BlockExplorer, ConfigError, NativeCurrency, Network};

/// A named set of networks sharing one L1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGroupConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Member networks, first one is the group default
    pub networks: Vec<Network>,
    pub l1_network: Network,
    #[serde(default)]
    pub hidden: bool,
}

/// Auto-refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshConfig {
    /// Milliseconds between refresh cycles
    #[serde(default = "default_refresh_interval_ms")]
    pub interval_ms: u64,
}

/// Shortest refresh interval accepted; the countdown ticks once per second
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;

fn default_refresh_interval_ms() -> u64 {
    10_000
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_refresh_interval_ms(),
        }
    }
}

/// RPC client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub network_groups: BTreeMap<String, NetworkGroupConfig>,

    pub default_group_key: String,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub rpc: RpcConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut network_groups = BTreeMap::new();
        network_groups.insert(
            "mainnet".to_string(),
            NetworkGroupConfig {
                name: "Mainnet".to_string(),
                description: "Production networks".to_string(),
                networks: vec![networks::era_mainnet(), networks::gateway_mainnet()],
                l1_network: networks::ethereum_mainnet(),
                hidden: false,
            },
        );
        network_groups.insert(
            "testnet".to_string(),
            NetworkGroupConfig {
                name: "Testnet".to_string(),
                description: "Test networks for development".to_string(),
                networks: vec![networks::era_sepolia(), networks::gateway_testnet()],
                l1_network: networks::ethereum_sepolia(),
                hidden: false,
            },
        );
        network_groups.insert(
            "local".to_string(),
            NetworkGroupConfig {
                name: "Local".to_string(),
                description: "Local development networks".to_string(),
                networks: vec![networks::zksync_os_local()],
                l1_network: networks::ethereum_anvil(),
                hidden: true,
            },
        );
        network_groups.insert(
            "testing".to_string(),
            NetworkGroupConfig {
                name: "Testing".to_string(),
                description: "Internal testing networks".to_string(),
                networks: vec![networks::era_stage()],
                l1_network: networks::ethereum_sepolia(),
                hidden: true,
            },
        );

        Self {
            network_groups,
            default_group_key: "mainnet".to_string(),
            refresh: RefreshConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

/// Stock network definitions
pub mod networks {
    use super::*;

    fn explorer(name: &str, url: &str, api_url: &str) -> Option<BlockExplorer> {
        Some(BlockExplorer {
            name: name.to_string(),
            url: url.to_string(),
            api_url: api_url.to_string(),
        })
    }

    fn zk_token() -> NativeCurrency {
        NativeCurrency {
            name: "ZKsync".to_string(),
            symbol: "ZK".to_string(),
            decimals: 18,
        }
    }

    pub fn ethereum_mainnet() -> Network {
        Network {
            id: 1,
            key: "ethereum-mainnet".to_string(),
            name: "Ethereum".to_string(),
            rpc_urls: vec![
                "https://ethereum-rpc.publicnode.com".to_string(),
                "https://cloudflare-eth.com".to_string(),
            ],
            block_explorer: explorer(
                "Etherscan",
                "https://etherscan.io",
                "https://api.etherscan.io/api",
            ),
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: false,
            native_token_bridging_only: false,
        }
    }

    pub fn ethereum_sepolia() -> Network {
        Network {
            id: 11_155_111,
            key: "ethereum-sepolia".to_string(),
            name: "Ethereum Sepolia Testnet".to_string(),
            rpc_urls: vec![
                "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
                "https://rpc.sepolia.org".to_string(),
            ],
            block_explorer: explorer(
                "Etherscan",
                "https://sepolia.etherscan.io",
                "https://api-sepolia.etherscan.io/api",
            ),
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: false,
        }
    }

    pub fn ethereum_anvil() -> Network {
        Network {
            id: 31_337,
            key: "ethereum-anvil".to_string(),
            name: "Ethereum Anvil".to_string(),
            rpc_urls: vec!["http://localhost:8545".to_string()],
            block_explorer: None,
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: false,
        }
    }

    pub fn era_mainnet() -> Network {
        Network {
            id: 324,
            key: "era-mainnet".to_string(),
            name: "ZKsync Era".to_string(),
            rpc_urls: vec!["https://mainnet.era.zksync.io".to_string()],
            block_explorer: explorer(
                "Era Explorer",
                "https://era.zksync.network",
                "https://block-explorer-api.mainnet.zksync.io",
            ),
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: false,
            native_token_bridging_only: false,
        }
    }

    pub fn era_sepolia() -> Network {
        Network {
            id: 300,
            key: "era-sepolia".to_string(),
            name: "ZKsync Era Sepolia".to_string(),
            rpc_urls: vec!["https://sepolia.era.zksync.dev".to_string()],
            block_explorer: explorer(
                "Era Testnet Explorer",
                "https://sepolia-era.zksync.network",
                "https://block-explorer-api.sepolia.zksync.dev",
            ),
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: false,
        }
    }

    pub fn era_stage() -> Network {
        Network {
            id: 270,
            key: "era-stage".to_string(),
            name: "ZKsync Stage".to_string(),
            rpc_urls: vec!["https://z2-dev-api.zksync.dev".to_string()],
            block_explorer: explorer(
                "Era Stage Explorer",
                "https://sepolia-beta.staging-scan-v2.zksync.dev",
                "https://block-explorer-api.stage.zksync.dev",
            ),
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: false,
        }
    }

    pub fn gateway_mainnet() -> Network {
        Network {
            id: 9075,
            key: "gateway-mainnet".to_string(),
            name: "ZKsync Gateway".to_string(),
            rpc_urls: vec!["https://rpc.era-gateway-mainnet.zksync.dev".to_string()],
            block_explorer: explorer(
                "Gateway Explorer",
                "https://explorer.era-gateway-mainnet.zksync.dev",
                "https://block-explorer-api.era-gateway-mainnet.zksync.dev",
            ),
            native_currency: zk_token(),
            l1_network: None,
            testnet: false,
            native_token_bridging_only: true,
        }
    }

    pub fn gateway_testnet() -> Network {
        Network {
            id: 32_657,
            key: "gateway-testnet".to_string(),
            name: "ZKsync Gateway Testnet".to_string(),
            rpc_urls: vec!["https://rpc.era-gateway-testnet.zksync.dev".to_string()],
            block_explorer: explorer(
                "Gateway Testnet Explorer",
                "https://explorer.era-gateway-testnet.zksync.dev",
                "https://block-explorer.era-gateway-testnet.zksync.dev",
            ),
            native_currency: zk_token(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: true,
        }
    }

    pub fn zksync_os_local() -> Network {
        Network {
            id: 260,
            key: "zksync-os".to_string(),
            name: "ZKsync OS".to_string(),
            rpc_urls: vec!["http://localhost:3050".to_string()],
            block_explorer: None,
            native_currency: NativeCurrency::ether(),
            l1_network: None,
            testnet: true,
            native_token_bridging_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_group_key, "mainnet");
        assert_eq!(config.refresh.interval_ms, 10_000);
        assert_eq!(config.rpc.request_timeout_secs, 30);
        assert_eq!(config.network_groups.len(), 4);
        assert!(config.network_groups["local"].hidden);
        assert_eq!(config.network_groups["mainnet"].networks[0].id, 324);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = AppConfig::from_json(&json).unwrap();
        assert_eq!(parsed.default_group_key, config.default_group_key);
        assert_eq!(
            parsed.network_groups["testnet"].l1_network,
            config.network_groups["testnet"].l1_network
        );
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let raw = r#"{
            "networkGroups": {
                "dev": {
                    "name": "Dev",
                    "networks": [{
                        "id": 260, "key": "zksync-os", "name": "ZKsync OS",
                        "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
                    }],
                    "l1Network": {
                        "id": 31337, "key": "ethereum-anvil", "name": "Anvil",
                        "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
                    }
                }
            },
            "defaultGroupKey": "dev"
        }"#;
        let config = AppConfig::from_json(raw).unwrap();
        assert_eq!(config.refresh.interval_ms, 10_000);
        let group = &config.network_groups["dev"];
        assert!(!group.hidden);
        assert!(group.networks[0].rpc_urls.is_empty());
        assert!(!group.networks[0].native_token_bridging_only);
    }

    #[test]
    fn test_missing_field_fails_fast() {
        let err = AppConfig::from_json(r#"{ "networkGroups": {} }"#).unwrap_err();
        assert_eq!(err.error_code(), "config_parse");
    }
}
