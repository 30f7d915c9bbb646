//! Bridge fee arithmetic
//!
//! All amounts are integers in the smallest unit of their token. Nothing in
//! here touches floating point.

use serde::{Deserialize, Serialize};

use portal_core::constants::{L1_ETH_ADDRESS, L2_BASE_TOKEN_ADDRESS};
use portal_core::{Address, Amount, Layer, Network, Token, TransferType};

use crate::constants::{
    GAS_LIMIT_CONTRACT, GAS_LIMIT_NATIVE, GAS_PADDING_DENOMINATOR, GAS_PADDING_NUMERATOR,
};
use crate::network::layer_of;

/// Token used to pay the bridge transaction fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayment {
    pub address: Address,
    pub symbol: String,
    pub native: bool,
}

/// Quick-select amounts for the 25/50/75/100% buttons.
///
/// All four are `None` when the balance cannot cover the fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageAmounts {
    pub quarter: Option<Amount>,
    pub half: Option<Amount>,
    pub three_quarters: Option<Amount>,
    pub max: Option<Amount>,
}

impl PercentageAmounts {
    pub fn none() -> Self {
        Self::default()
    }

    fn of(available: Amount) -> Self {
        Self {
            quarter: Some(available / 4),
            half: Some(available / 2),
            three_quarters: Some(three_quarters(available)),
            max: Some(available),
        }
    }

    pub fn get(&self, percentage: Percentage) -> Option<Amount> {
        match percentage {
            Percentage::Quarter => self.quarter,
            Percentage::Half => self.half,
            Percentage::ThreeQuarters => self.three_quarters,
            Percentage::Max => self.max,
        }
    }
}

/// Quick-select tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Percentage {
    Quarter,
    Half,
    ThreeQuarters,
    Max,
}

impl Percentage {
    pub fn as_percent(&self) -> u8 {
        match self {
            Self::Quarter => 25,
            Self::Half => 50,
            Self::ThreeQuarters => 75,
            Self::Max => 100,
        }
    }
}

impl TryFrom<u8> for Percentage {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            25 => Ok(Self::Quarter),
            50 => Ok(Self::Half),
            75 => Ok(Self::ThreeQuarters),
            100 => Ok(Self::Max),
            other => Err(other),
        }
    }
}

/// floor(3x / 4) without overflowing on large balances
fn three_quarters(x: Amount) -> Amount {
    (x / 4) * 3 + (x % 4) * 3 / 4
}

/// Whether the transferred token is the one the fee is paid in.
///
/// ETH deposits from L1, base token withdrawals and any token flagged native
/// all pay fees out of the transferred balance.
pub fn is_transferring_fee_token(transfer_type: TransferType, token: &Token) -> bool {
    (transfer_type == TransferType::Deposit && token.l1_address.matches(L1_ETH_ADDRESS))
        || (transfer_type == TransferType::Withdraw
            && token.l2_address.matches(L2_BASE_TOKEN_ADDRESS))
        || token.native
}

/// Static gas limit for a transfer. Native transfers are cheap, ERC20
/// transfers go through bridge contracts.
pub fn gas_limit_for(transfer_type: TransferType, native: bool) -> u128 {
    match transfer_type {
        TransferType::None => GAS_LIMIT_NATIVE,
        _ if native => GAS_LIMIT_NATIVE,
        _ => GAS_LIMIT_CONTRACT,
    }
}

/// `gas_limit * gas_price * 1.15`, truncated
pub fn padded_fee(gas_limit: u128, gas_price: u128) -> Amount {
    gas_limit
        .saturating_mul(gas_price)
        .saturating_mul(GAS_PADDING_NUMERATOR)
        / GAS_PADDING_DENOMINATOR
}

/// What arrives on the other side. Only fee-token transfers lose the fee.
pub fn amount_after_fees(amount: Amount, fee: Amount, transferring_fee_token: bool) -> Amount {
    if transferring_fee_token {
        amount.saturating_sub(fee)
    } else {
        amount
    }
}

/// Quick-select amounts for a balance.
///
/// Fee-token transfers split `balance - fee`; a balance at or below the fee
/// has no valid amounts. Other tokens split the raw balance.
pub fn percentage_amounts(
    balance: Amount,
    fee: Amount,
    transferring_fee_token: bool,
) -> PercentageAmounts {
    if balance == 0 {
        return PercentageAmounts::none();
    }
    if !transferring_fee_token {
        return PercentageAmounts::of(balance);
    }
    if balance <= fee {
        return PercentageAmounts::none();
    }
    PercentageAmounts::of(balance - fee)
}

/// Fee token for a transfer leaving `from`.
///
/// Transfers out of an L1 pay in ETH. Transfers out of an L2 or Gateway pay
/// in that chain's base token. Without a source or a transfer type, ETH.
pub fn fee_payment(transfer_type: TransferType, from: Option<&Network>) -> FeePayment {
    let eth = || FeePayment {
        address: Address::new(L1_ETH_ADDRESS),
        symbol: "ETH".to_string(),
        native: true,
    };
    let Some(from) = from else {
        return eth();
    };
    let symbol = from.native_currency.symbol.clone();

    match transfer_type {
        TransferType::None => eth(),
        TransferType::Withdraw => FeePayment {
            address: Address::new(L2_BASE_TOKEN_ADDRESS),
            symbol,
            native: true,
        },
        _ if layer_of(from) == Layer::L1 => FeePayment {
            address: Address::new(L1_ETH_ADDRESS),
            symbol,
            native: true,
        },
        _ => FeePayment {
            address: Address::new(L2_BASE_TOKEN_ADDRESS),
            symbol,
            native: true,
        },
    }
}
