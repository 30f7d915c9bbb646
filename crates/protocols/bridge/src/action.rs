//! Bridge button state and balance display

use serde::Serialize;

use portal_core::format::pretty_value;
use portal_core::{Amount, NetworkRegistry, Token, TransferType};

use crate::calculator::is_transferring_fee_token;
use crate::constants::BALANCE_DISPLAY_DECIMALS;
use crate::state::BridgeState;

/// Label and enabled state of the bridge button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeAction {
    pub message: String,
    pub disabled: bool,
}

impl BridgeAction {
    fn blocked(message: &str) -> Self {
        Self {
            message: message.to_string(),
            disabled: true,
        }
    }
}

/// Validate the form in order and report the first problem.
///
/// The balance check only applies when the fee is paid out of the
/// transferred token. An unknown network counts as an unbridgeable route.
pub fn bridge_action_state(
    bridge: &BridgeState,
    fee: Option<Amount>,
    registry: &NetworkRegistry,
) -> BridgeAction {
    let Some(token) = bridge.token_to_transfer() else {
        return BridgeAction::blocked("Select a token");
    };
    let Some(amount) = bridge.transfer_amount().filter(|a| *a > 0) else {
        return BridgeAction::blocked("Enter an amount");
    };

    let transfer_type = bridge
        .transfer_type(registry)
        .unwrap_or(TransferType::None);

    if let (Some(balance), Some(fee)) = (token.balance(), fee) {
        if transfer_type.is_bridgeable()
            && is_transferring_fee_token(transfer_type, token)
            && amount.saturating_add(fee) > balance
        {
            return BridgeAction::blocked("Insufficient balance for amount + fee");
        }
    }

    if bridge.to_network_id().is_none() {
        return BridgeAction::blocked("Select destination");
    }

    if transfer_type.is_bridgeable() {
        return BridgeAction {
            message: format!("{} {}", transfer_type, token.symbol),
            disabled: false,
        };
    }

    BridgeAction::blocked("Cannot bridge")
}

/// Selected token balance as `1.245 ETH`, only while a wallet is connected
pub fn formatted_balance(connected: bool, token: Option<&Token>) -> Option<String> {
    if !connected {
        return None;
    }
    let token = token?;
    let amount = token.balance()?;
    let (pretty, _) = pretty_value(amount, token.decimals, BALANCE_DISPLAY_DECIMALS);
    Some(format!("{} {}", pretty, token.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::constants::{L1_ETH_ADDRESS, L2_BASE_TOKEN_ADDRESS};
    use portal_core::{Address, AppConfig};

    const ETH: u128 = 1_000_000_000_000_000_000;

    fn registry() -> NetworkRegistry {
        NetworkRegistry::from_config(&AppConfig::default()).unwrap()
    }

    fn eth(amount: Option<Amount>) -> Token {
        Token {
            l1_address: Address::new(L1_ETH_ADDRESS),
            l2_address: Address::new(L2_BASE_TOKEN_ADDRESS),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            usd_price: None,
            liquidity: None,
            icon_url: None,
            l1_token: true,
            amount,
            usd_balance: None,
            native: false,
        }
    }

    #[test]
    fn test_validation_order() {
        let registry = registry();
        let mut bridge = BridgeState::new(registry.default_group());

        let action = bridge_action_state(&bridge, None, &registry);
        assert_eq!(action, BridgeAction::blocked("Select a token"));

        bridge.select_token(Some(eth(Some(ETH))));
        let action = bridge_action_state(&bridge, None, &registry);
        assert_eq!(action.message, "Enter an amount");

        bridge.set_transfer_amount(Some(0));
        let action = bridge_action_state(&bridge, None, &registry);
        assert_eq!(action.message, "Enter an amount");

        bridge.set_transfer_amount(Some(ETH / 2));
        let action = bridge_action_state(&bridge, Some(1_000), &registry);
        assert_eq!(action.message, "Select destination");

        bridge.select_to_network(324).unwrap();
        bridge.set_transfer_amount(Some(ETH / 2));
        let action = bridge_action_state(&bridge, Some(1_000), &registry);
        assert_eq!(action.message, "deposit ETH");
        assert!(!action.disabled);
    }

    #[test]
    fn test_insufficient_balance_for_fee() {
        let registry = registry();
        let mut bridge = BridgeState::new(registry.default_group());
        bridge.select_to_network(324).unwrap();
        bridge.select_token(Some(eth(Some(ETH))));
        bridge.set_transfer_amount(Some(ETH));

        let action = bridge_action_state(&bridge, Some(1), &registry);
        assert_eq!(action.message, "Insufficient balance for amount + fee");
        assert!(action.disabled);

        // Fee not known yet: no balance check
        let action = bridge_action_state(&bridge, None, &registry);
        assert_eq!(action.message, "deposit ETH");
    }

    #[test]
    fn test_unbridgeable_route() {
        let registry = registry();
        let mut bridge = BridgeState::new(registry.default_group());
        // L1 -> L1 is not bridgeable
        bridge.select_to_network(11_155_111).unwrap();
        bridge.select_token(Some(eth(None)));
        bridge.set_transfer_amount(Some(5));

        let action = bridge_action_state(&bridge, None, &registry);
        assert_eq!(action.message, "Cannot bridge");
        assert!(action.disabled);
    }

    #[test]
    fn test_formatted_balance() {
        let token = eth(Some(ETH + ETH / 4));
        assert_eq!(formatted_balance(false, Some(&token)), None);
        assert_eq!(
            formatted_balance(true, Some(&token)).as_deref(),
            Some("1.25 ETH")
        );
        assert_eq!(formatted_balance(true, Some(&eth(Some(0)))), None);
        assert_eq!(formatted_balance(true, None), None);
    }
}
