//! Validated network registry
//!
//! Built once from [`AppConfig`]. Every member network of a group is linked
//! to the group's L1, so lookups never have to guess a network's layer.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::{AppConfig, ChainId, ConfigError, Network, NetworkError, MIN_REFRESH_INTERVAL_MS};

/// A group of networks sharing one L1
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGroup {
    pub key: String,
    pub name: String,
    pub description: String,
    /// Non-empty, first entry is the default
    pub networks: Vec<Network>,
    pub l1_network: Network,
    pub hidden: bool,
}

impl NetworkGroup {
    /// Network selectable in this group: the L1 followed by its members
    pub fn network_list(&self) -> Vec<&Network> {
        std::iter::once(&self.l1_network)
            .chain(self.networks.iter())
            .collect()
    }

    /// The group's default member network
    pub fn default_network(&self) -> &Network {
        &self.networks[0]
    }

    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.l1_network.id == chain_id || self.networks.iter().any(|n| n.id == chain_id)
    }
}

/// Registry of all configured network groups
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    groups: BTreeMap<String, NetworkGroup>,
    by_id: HashMap<ChainId, Network>,
    default_group_key: String,
}

impl NetworkRegistry {
    /// Validate the configuration and build the registry.
    ///
    /// Fails on the first integrity problem: a refresh interval under one
    /// second, unknown default group, empty group, an L1 that has a parent,
    /// a member pointing at a different L1, duplicates within a group, or two
    /// disagreeing definitions of one chain.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        if config.refresh.interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(ConfigError::InvalidRefreshInterval {
                interval_ms: config.refresh.interval_ms,
                min_ms: MIN_REFRESH_INTERVAL_MS,
            });
        }

        if !config.network_groups.contains_key(&config.default_group_key) {
            return Err(ConfigError::InvalidDefaultNetwork {
                key: config.default_group_key.clone(),
            });
        }

        let mut groups = BTreeMap::new();
        let mut by_id: HashMap<ChainId, Network> = HashMap::new();
        let mut key_to_id: HashMap<String, ChainId> = HashMap::new();

        for (key, group_config) in &config.network_groups {
            if group_config.networks.is_empty() {
                return Err(ConfigError::EmptyGroup { group: key.clone() });
            }

            let l1 = group_config.l1_network.clone();
            if let Some(parent) = l1.l1_network {
                return Err(ConfigError::InvalidL1 {
                    chain_id: l1.id,
                    reason: format!("group L1 must be a root, but links to {}", parent),
                });
            }

            let mut seen = HashSet::new();
            seen.insert(l1.id);
            let mut members = Vec::with_capacity(group_config.networks.len());
            for network in &group_config.networks {
                if !seen.insert(network.id) {
                    return Err(ConfigError::DuplicateNetwork {
                        group: key.clone(),
                        chain_id: network.id,
                    });
                }
                let mut member = network.clone();
                match member.l1_network {
                    Some(parent) if parent != l1.id => {
                        return Err(ConfigError::InvalidL1 {
                            chain_id: member.id,
                            reason: format!(
                                "links to {} but group '{}' settles on {}",
                                parent, key, l1.id
                            ),
                        });
                    }
                    _ => member.l1_network = Some(l1.id),
                }
                members.push(member);
            }

            for network in std::iter::once(&l1).chain(members.iter()) {
                register(&mut by_id, &mut key_to_id, network)?;
            }

            groups.insert(
                key.clone(),
                NetworkGroup {
                    key: key.clone(),
                    name: group_config.name.clone(),
                    description: group_config.description.clone(),
                    networks: members,
                    l1_network: l1,
                    hidden: group_config.hidden,
                },
            );
        }

        tracing::info!(
            groups = groups.len(),
            networks = by_id.len(),
            default_group = %config.default_group_key,
            "Network registry loaded"
        );

        Ok(Self {
            groups,
            by_id,
            default_group_key: config.default_group_key.clone(),
        })
    }

    /// Look up a network by chain id
    pub fn network(&self, chain_id: ChainId) -> Result<&Network, NetworkError> {
        self.by_id
            .get(&chain_id)
            .ok_or(NetworkError::NotFound { chain_id })
    }

    /// Look up a network by its slug
    pub fn network_by_key(&self, key: &str) -> Option<&Network> {
        self.by_id.values().find(|n| n.key == key)
    }

    pub fn group(&self, key: &str) -> Result<&NetworkGroup, NetworkError> {
        self.groups.get(key).ok_or_else(|| NetworkError::GroupNotFound {
            key: key.to_string(),
        })
    }

    pub fn default_group_key(&self) -> &str {
        &self.default_group_key
    }

    pub fn default_group(&self) -> &NetworkGroup {
        // from_config guarantees the default group exists
        &self.groups[&self.default_group_key]
    }

    /// Groups offered in the group picker
    pub fn visible_groups(&self) -> Vec<&NetworkGroup> {
        self.groups.values().filter(|g| !g.hidden).collect()
    }

    pub fn groups(&self) -> impl Iterator<Item = &NetworkGroup> {
        self.groups.values()
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.by_id.values()
    }
}

fn register(
    by_id: &mut HashMap<ChainId, Network>,
    key_to_id: &mut HashMap<String, ChainId>,
    network: &Network,
) -> Result<(), ConfigError> {
    let conflict = || ConfigError::ConflictingNetwork {
        chain_id: network.id,
        key: network.key.clone(),
    };

    if let Some(existing) = by_id.get(&network.id) {
        if existing != network {
            return Err(conflict());
        }
    }
    if let Some(id) = key_to_id.get(&network.key) {
        if *id != network.id {
            return Err(conflict());
        }
    }

    by_id.insert(network.id, network.clone());
    key_to_id.insert(network.key.clone(), network.id);
    Ok(())
}
