//! ZKsync Bridge
//!
//! Moves ETH and ERC20 tokens between Ethereum (L1), ZKsync chains (L2) and
//! the ZKsync Gateway. This crate decides what kind of transfer a network
//! pair is, estimates its fee from a polled gas price and holds the bridge
//! form state. Transaction submission happens in the wallet.

pub mod action;
pub mod calculator;
pub mod constants;
pub mod fee;
pub mod network;
pub mod state;
pub mod tokens;

pub use action::{bridge_action_state, formatted_balance, BridgeAction};
pub use calculator::{FeePayment, Percentage, PercentageAmounts};
pub use fee::{FeeEstimator, FeePhase, FeeSnapshot, GasPriceSource, GasPriceState};
pub use network::{classify_transfer, layer_of, layer_of_id, transfer_type_of};
pub use state::{BridgeState, SharedBridgeState};
pub use tokens::{apply_balances, l1_tokens, tokens_by_l2_address, TokenBalance};
