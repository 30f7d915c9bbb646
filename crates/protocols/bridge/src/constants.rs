//! Bridge protocol constants

/// Gas limit for moving a chain's native asset (ETH or base token)
pub const GAS_LIMIT_NATIVE: u128 = 200_000;

/// Gas limit for ERC20 transfers, which go through bridge contracts
pub const GAS_LIMIT_CONTRACT: u128 = 1_000_000;

/// Gas padding as a ratio (115 / 100 = 1.15)
pub const GAS_PADDING_NUMERATOR: u128 = 115;
pub const GAS_PADDING_DENOMINATOR: u128 = 100;

/// Refresh subscription name used for gas price polling
pub const GAS_PRICE_SUBSCRIPTION: &str = "gas-price";

/// Decimals shown for fees and post-fee amounts
pub const FEE_DISPLAY_DECIMALS: usize = 6;

/// Decimals shown for balances
pub const BALANCE_DISPLAY_DECIMALS: usize = 6;

/// Shown when a gas price fetch fails
pub const GAS_PRICE_ERROR_MESSAGE: &str = "Failed to fetch gas price. Please try again.";
