//! Network layer and transfer type classification
//!
//! A network with no parent is an L1. Anything settling on an L1 is a
//! Gateway when only the native token can be bridged to it, otherwise an L2.

use portal_core::{ChainId, Layer, Network, NetworkError, NetworkRegistry, TransferType};

/// Layer of a network
pub fn layer_of(network: &Network) -> Layer {
    if network.is_l1() {
        Layer::L1
    } else if network.native_token_bridging_only {
        Layer::Gateway
    } else {
        Layer::L2
    }
}

/// Layer of a registered network. Unknown ids are an error, never a default.
pub fn layer_of_id(chain_id: ChainId, registry: &NetworkRegistry) -> Result<Layer, NetworkError> {
    registry.network(chain_id).map(layer_of)
}

/// Transfer type for a (from, to) layer pair.
///
/// | from \ to | L1       | L2      | Gateway |
/// |-----------|----------|---------|---------|
/// | L1        | none     | deposit | deposit |
/// | L2        | withdraw | deposit | deposit |
/// | Gateway   | withdraw | interop | none    |
pub fn transfer_type_of(from: Layer, to: Layer) -> TransferType {
    use Layer::*;

    match (from, to) {
        (L1, L2) | (L1, Gateway) => TransferType::Deposit,
        (L2, L1) => TransferType::Withdraw,
        (L2, L2) | (L2, Gateway) => TransferType::Deposit,
        (Gateway, L1) => TransferType::Withdraw,
        (Gateway, L2) => TransferType::Interop,
        (L1, L1) | (Gateway, Gateway) => TransferType::None,
    }
}

/// Transfer type for a selected network pair. `None` if either side is unset.
pub fn classify_transfer(
    from: Option<ChainId>,
    to: Option<ChainId>,
    registry: &NetworkRegistry,
) -> Result<TransferType, NetworkError> {
    let (Some(from), Some(to)) = (from, to) else {
        return Ok(TransferType::None);
    };
    let from_layer = layer_of_id(from, registry)?;
    let to_layer = layer_of_id(to, registry)?;
    Ok(transfer_type_of(from_layer, to_layer))
}
