//! Bridge fee estimation
//!
//! Polls the gas price of the source network through the shared refresh
//! scheduler and derives the fee figures shown on the bridge form. A failed
//! fetch is kept as state; the last good gas price stays in use until the
//! next successful fetch.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use portal_core::constants::BASE_TOKEN_DECIMALS;
use portal_core::format::{format_fixed, format_units};
use portal_core::{Amount, ChainId, FeeError, NetworkRegistry, Token, TransferType};
use portal_refresh::{CallbackError, RefreshScheduler, Subscription};
use portal_rpc::RpcClient;

use crate::calculator::{
    amount_after_fees, fee_payment, gas_limit_for, is_transferring_fee_token, padded_fee,
    percentage_amounts, Percentage, PercentageAmounts,
};
use crate::constants::{FEE_DISPLAY_DECIMALS, GAS_PRICE_ERROR_MESSAGE, GAS_PRICE_SUBSCRIPTION};
use crate::state::{BridgeState, SharedBridgeState};

/// Anything that can quote a chain's current gas price
#[async_trait]
pub trait GasPriceSource: Send + Sync {
    async fn gas_price(&self, chain_id: ChainId) -> Result<u128, FeeError>;
}

#[async_trait]
impl GasPriceSource for RpcClient {
    async fn gas_price(&self, chain_id: ChainId) -> Result<u128, FeeError> {
        RpcClient::gas_price(self, chain_id)
            .await
            .map_err(|e| FeeError::GasPriceFetchFailed {
                chain_id,
                reason: e.to_string(),
            })
    }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Gas price fetch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePhase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Route a gas price was fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FeeContext {
    from_network_id: ChainId,
    transfer_type: TransferType,
}

impl FeeContext {
    /// `None` until the route is complete and bridgeable
    fn of(bridge: &BridgeState, registry: &NetworkRegistry) -> Option<Self> {
        let from_network_id = bridge.from_network_id()?;
        let transfer_type = bridge.transfer_type(registry).ok()?;
        transfer_type.is_bridgeable().then_some(Self {
            from_network_id,
            transfer_type,
        })
    }
}

/// Gas price state held by the estimator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceState {
    pub phase: FeePhase,
    pub gas_price: Option<u128>,
    pub error: Option<String>,
}

impl Default for GasPriceState {
    fn default() -> Self {
        Self {
            phase: FeePhase::Idle,
            gas_price: None,
            error: None,
        }
    }
}

/// Fee figures for the current bridge selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSnapshot {
    /// Padded fee in the fee token's smallest unit
    pub fee: Option<Amount>,
    /// e.g. `0.005750 ETH`
    pub formatted_fee: Option<String>,
    pub fee_token_symbol: Option<String>,
    pub amount_after_fees: Option<Amount>,
    pub formatted_amount_after_fees: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

struct EstimatorState {
    gas: GasPriceState,
    context: Option<FeeContext>,
    generation: u64,
}

// ─── Pure derivations ────────────────────────────────────────────────────────

/// Padded fee for the selection, if a gas price is known
pub fn calculated_fee(
    gas: &GasPriceState,
    bridge: &BridgeState,
    registry: &NetworkRegistry,
) -> Option<Amount> {
    let transfer_type = bridge.transfer_type(registry).ok()?;
    if !transfer_type.is_bridgeable() {
        return None;
    }
    let token = bridge.token_to_transfer()?;
    let gas_price = gas.gas_price?;

    let native = is_transferring_fee_token(transfer_type, token);
    Some(padded_fee(gas_limit_for(transfer_type, native), gas_price))
}

/// Full fee snapshot for the selection
pub fn compute_snapshot(
    gas: &GasPriceState,
    bridge: &BridgeState,
    registry: &NetworkRegistry,
) -> FeeSnapshot {
    let mut snapshot = FeeSnapshot {
        fee: None,
        formatted_fee: None,
        fee_token_symbol: None,
        amount_after_fees: None,
        formatted_amount_after_fees: None,
        is_loading: gas.phase == FeePhase::Loading,
        error: gas.error.clone(),
    };

    let transfer_type = bridge
        .transfer_type(registry)
        .unwrap_or(TransferType::None);
    let Some(token) = bridge.token_to_transfer() else {
        return snapshot;
    };
    if !transfer_type.is_bridgeable() {
        return snapshot;
    }

    let from = bridge
        .from_network_id()
        .and_then(|id| registry.network(id).ok());
    let payment = fee_payment(transfer_type, from);
    let fee_decimals = from
        .map(|n| n.native_currency.decimals)
        .unwrap_or(BASE_TOKEN_DECIMALS);

    let fee = calculated_fee(gas, bridge, registry);
    snapshot.formatted_fee = fee.map(|fee| {
        format!(
            "{} {}",
            format_fixed(fee, fee_decimals, FEE_DISPLAY_DECIMALS),
            payment.symbol
        )
    });
    snapshot.fee_token_symbol = Some(payment.symbol);
    snapshot.fee = fee;

    if let (Some(fee), Some(amount)) = (fee, bridge.transfer_amount().filter(|a| *a > 0)) {
        let (after, formatted) = after_fees_display(transfer_type, token, amount, fee);
        snapshot.amount_after_fees = Some(after);
        snapshot.formatted_amount_after_fees = Some(formatted);
    }

    snapshot
}

fn after_fees_display(
    transfer_type: TransferType,
    token: &Token,
    amount: Amount,
    fee: Amount,
) -> (Amount, String) {
    if is_transferring_fee_token(transfer_type, token) {
        let after = amount_after_fees(amount, fee, true);
        let formatted = format!(
            "{} {}",
            format_fixed(after, token.decimals, FEE_DISPLAY_DECIMALS),
            token.symbol
        );
        (after, formatted)
    } else {
        let formatted = format!("{} {}", format_units(amount, token.decimals), token.symbol);
        (amount, formatted)
    }
}

/// Quick-select amounts for the selected token's balance
pub fn compute_percentage_amounts(
    gas: &GasPriceState,
    bridge: &BridgeState,
    registry: &NetworkRegistry,
) -> PercentageAmounts {
    let (Some(token), Some(fee)) = (bridge.token_to_transfer(), calculated_fee(gas, bridge, registry))
    else {
        return PercentageAmounts::none();
    };
    let Some(balance) = token.balance() else {
        return PercentageAmounts::none();
    };
    let transfer_type = bridge
        .transfer_type(registry)
        .unwrap_or(TransferType::None);

    percentage_amounts(balance, fee, is_transferring_fee_token(transfer_type, token))
}

// ─── FeeEstimator ────────────────────────────────────────────────────────────

/// Gas price poller and fee calculator. Cheap to clone.
#[derive(Clone)]
pub struct FeeEstimator {
    source: Arc<dyn GasPriceSource>,
    registry: Arc<NetworkRegistry>,
    state: Arc<Mutex<EstimatorState>>,
}

impl FeeEstimator {
    pub fn new(source: Arc<dyn GasPriceSource>, registry: Arc<NetworkRegistry>) -> Self {
        Self {
            source,
            registry,
            state: Arc::new(Mutex::new(EstimatorState {
                gas: GasPriceState::default(),
                context: None,
                generation: 0,
            })),
        }
    }

    /// Fetch the gas price for the selection's source network.
    ///
    /// Returns `Ok(None)` without fetching when the route is incomplete or
    /// not bridgeable. On failure the previous gas price is kept.
    pub async fn refresh(&self, bridge: &BridgeState) -> Result<Option<u128>, FeeError> {
        let Some(context) = FeeContext::of(bridge, &self.registry) else {
            tracing::debug!("Skipping gas price fetch, no bridgeable route selected");
            return Ok(None);
        };
        self.fetch_gas_price(context).await.map(Some)
    }

    /// Refetch when the source network or transfer type changed since the
    /// last call
    pub async fn sync_context(&self, bridge: &BridgeState) -> Result<Option<u128>, FeeError> {
        let context = FeeContext::of(bridge, &self.registry);
        {
            let mut state = self.state.lock().await;
            if state.context == context {
                return Ok(None);
            }
            state.context = context;
        }
        match context {
            Some(context) => self.fetch_gas_price(context).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_gas_price(&self, context: FeeContext) -> Result<u128, FeeError> {
        let chain_id = context.from_network_id;
        let generation = {
            let mut state = self.state.lock().await;
            state.gas.phase = FeePhase::Loading;
            state.gas.error = None;
            state.generation += 1;
            state.generation
        };
        tracing::debug!(chain_id, transfer_type = %context.transfer_type, "Fetching gas price");

        let result = self.source.gas_price(chain_id).await;

        let mut state = self.state.lock().await;
        // A newer fetch owns the state now
        let current = state.generation == generation;
        match &result {
            Ok(price) => {
                tracing::debug!(chain_id, gas_price = %price, "Gas price fetched");
                if current {
                    state.gas.gas_price = Some(*price);
                    state.gas.phase = FeePhase::Ready;
                }
            }
            Err(e) => {
                tracing::warn!(chain_id, error = %e, "Gas price fetch failed");
                if current {
                    state.gas.error = Some(GAS_PRICE_ERROR_MESSAGE.to_string());
                    state.gas.phase = FeePhase::Error;
                }
            }
        }
        result
    }

    /// Poll the gas price on every scheduler cycle.
    ///
    /// The bridge state is read at the start of each cycle. Fetch failures
    /// are also reported to the scheduler as this subscriber's error.
    pub fn attach(&self, scheduler: &RefreshScheduler, bridge: SharedBridgeState) -> Subscription {
        let estimator = self.clone();
        scheduler.subscribe(GAS_PRICE_SUBSCRIPTION, move || {
            let estimator = estimator.clone();
            let bridge = bridge.clone();
            async move {
                let selection = bridge.read().await.clone();
                estimator
                    .refresh(&selection)
                    .await
                    .map(|_| ())
                    .map_err(|e| Box::new(e) as CallbackError)
            }
        })
    }

    pub async fn gas_state(&self) -> GasPriceState {
        self.state.lock().await.gas.clone()
    }

    pub async fn fee(&self, bridge: &BridgeState) -> Option<Amount> {
        let gas = self.gas_state().await;
        calculated_fee(&gas, bridge, &self.registry)
    }

    pub async fn snapshot(&self, bridge: &BridgeState) -> FeeSnapshot {
        let gas = self.gas_state().await;
        compute_snapshot(&gas, bridge, &self.registry)
    }

    pub async fn percentage_amounts(&self, bridge: &BridgeState) -> PercentageAmounts {
        let gas = self.gas_state().await;
        compute_percentage_amounts(&gas, bridge, &self.registry)
    }

    /// Write a quick-select tier into the transfer amount.
    ///
    /// Leaves the amount untouched when no token is selected or the tier has
    /// no valid value.
    pub async fn set_percentage_amount(
        &self,
        bridge: &mut BridgeState,
        percentage: Percentage,
    ) -> Option<Amount> {
        bridge.token_to_transfer()?;
        let amount = self.percentage_amounts(bridge).await.get(percentage)?;
        bridge.set_transfer_amount(Some(amount));
        Some(amount)
    }
}
