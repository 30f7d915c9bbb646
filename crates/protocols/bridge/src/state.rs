//! Bridge form state
//!
//! Source and destination networks, the token being moved and the amount.
//! Every mutation keeps the source and destination distinct and clears the
//! amount when the route changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use portal_core::{
    Amount, ChainId, Network, NetworkError, NetworkGroup, NetworkRegistry, SelectionError, Token,
    TransferType,
};

use crate::network::classify_transfer;

/// Bridge state shared between the app and the fee estimator
pub type SharedBridgeState = Arc<RwLock<BridgeState>>;

/// Current bridge selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    from_network_id: Option<ChainId>,
    to_network_id: Option<ChainId>,
    token_to_transfer: Option<Token>,
    transfer_amount: Option<Amount>,
}

impl BridgeState {
    /// Fresh state for a group: source is the group's L1, nothing else chosen
    pub fn new(group: &NetworkGroup) -> Self {
        Self {
            from_network_id: Some(group.l1_network.id),
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedBridgeState {
        Arc::new(RwLock::new(self))
    }

    pub fn from_network_id(&self) -> Option<ChainId> {
        self.from_network_id
    }

    pub fn to_network_id(&self) -> Option<ChainId> {
        self.to_network_id
    }

    pub fn token_to_transfer(&self) -> Option<&Token> {
        self.token_to_transfer.as_ref()
    }

    pub fn transfer_amount(&self) -> Option<Amount> {
        self.transfer_amount
    }

    /// Pick the source network. Picking the current destination clears it.
    pub fn select_from_network(&mut self, chain_id: ChainId) {
        if self.to_network_id == Some(chain_id) {
            self.to_network_id = None;
        }
        self.from_network_id = Some(chain_id);
        self.transfer_amount = None;
    }

    /// Pick the destination network. It must differ from the source.
    pub fn select_to_network(&mut self, chain_id: ChainId) -> Result<(), SelectionError> {
        if self.from_network_id == Some(chain_id) {
            return Err(SelectionError::SameNetwork { chain_id });
        }
        self.to_network_id = Some(chain_id);
        self.transfer_amount = None;
        Ok(())
    }

    pub fn clear_to_network(&mut self) {
        self.to_network_id = None;
        self.transfer_amount = None;
    }

    /// Exchange source and destination.
    ///
    /// The token may not exist on the new source, so it is cleared along
    /// with the amount.
    pub fn swap_networks(&mut self) {
        std::mem::swap(&mut self.from_network_id, &mut self.to_network_id);
        self.token_to_transfer = None;
        self.transfer_amount = None;
    }

    /// Reset everything for a newly activated network group
    pub fn on_network_group_changed(&mut self, group: &NetworkGroup) {
        *self = Self::new(group);
    }

    pub fn select_token(&mut self, token: Option<Token>) {
        self.token_to_transfer = token;
    }

    pub fn set_transfer_amount(&mut self, amount: Option<Amount>) {
        self.transfer_amount = amount;
    }

    /// Transfer type of the selected route. `None` until both sides are set.
    pub fn transfer_type(&self, registry: &NetworkRegistry) -> Result<TransferType, NetworkError> {
        classify_transfer(self.from_network_id, self.to_network_id, registry)
    }

    /// Destinations on offer: the group's networks minus the current source
    pub fn to_network_options<'a>(&self, group: &'a NetworkGroup) -> Vec<&'a Network> {
        group
            .network_list()
            .into_iter()
            .filter(|n| Some(n.id) != self.from_network_id)
            .collect()
    }
}
