//! Application context shared by every bridge surface
//!
//! One instance per process. Holds the validated registry, the active network
//! group, the bridge form, the wallet session and the refresh machinery.
//! Selection changes go through here so the fee estimator sees them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge::{
    bridge_action_state, formatted_balance, BridgeAction, BridgeState, FeeEstimator, FeeSnapshot,
    GasPriceSource, Percentage, PercentageAmounts, SharedBridgeState,
};
use portal_core::{
    Address, Amount, AppConfig, ChainId, ConfigError, Network, NetworkError, NetworkGroup,
    NetworkRegistry, SelectionError, Token,
};
use portal_refresh::{RefreshScheduler, Subscription};
use portal_rpc::RpcClient;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Errors surfaced by context operations
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Invalid wallet address: {reason}")]
    InvalidAddress { reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// A connected wallet
#[derive(Clone, Debug)]
pub struct WalletState {
    pub address: Address,
    pub connected_at: Instant,
}

impl WalletState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            connected_at: Instant::now(),
        }
    }
}

/// Check for `0x` followed by 40 hex characters
fn validate_evm_address(address: &str) -> Result<Address, ContextError> {
    let address = Address::new(address.trim());
    if !address.as_str().starts_with("0x") {
        return Err(ContextError::InvalidAddress {
            reason: "Address must start with 0x".to_string(),
        });
    }
    if !address.is_well_formed() {
        return Err(ContextError::InvalidAddress {
            reason: format!(
                "Expected 40 hex characters after 0x, got '{}'",
                &address.as_str()[2..]
            ),
        });
    }
    Ok(address)
}

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: AppConfig,
    registry: Arc<NetworkRegistry>,
    active_group: RwLock<String>,
    bridge: SharedBridgeState,
    scheduler: RefreshScheduler,
    fee: FeeEstimator,
    wallet: RwLock<Option<WalletState>>,
    gas_subscription: Mutex<Option<Subscription>>,
}

impl AppContext {
    /// Build the context, fetching gas prices over JSON-RPC
    pub fn new(config: AppConfig) -> Result<Self, ContextError> {
        let registry = NetworkRegistry::from_config(&config)?;
        let rpc = RpcClient::from_registry(&registry, &config.rpc)?;
        Ok(Self::with_registry(config, registry, Arc::new(rpc)))
    }

    /// Build the context with a custom gas price source
    pub fn with_gas_source(
        config: AppConfig,
        source: Arc<dyn GasPriceSource>,
    ) -> Result<Self, ContextError> {
        let registry = NetworkRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry, source))
    }

    fn with_registry(
        config: AppConfig,
        registry: NetworkRegistry,
        source: Arc<dyn GasPriceSource>,
    ) -> Self {
        let registry = Arc::new(registry);
        let scheduler =
            RefreshScheduler::new(Duration::from_millis(config.refresh.interval_ms));
        let fee = FeeEstimator::new(source, registry.clone());
        let default_group = registry.default_group();
        let active_group = default_group.key.clone();
        let bridge = BridgeState::new(default_group).shared();

        Self {
            inner: Arc::new(AppContextInner {
                config,
                active_group: RwLock::new(active_group),
                registry,
                bridge,
                scheduler,
                fee,
                wallet: RwLock::new(None),
                gas_subscription: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.inner.registry
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.inner.scheduler
    }

    pub fn fee_estimator(&self) -> &FeeEstimator {
        &self.inner.fee
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Start gas price polling. A no-op when already mounted.
    pub async fn mount(&self) {
        let mut subscription = self.inner.gas_subscription.lock().await;
        if subscription.is_none() {
            *subscription = Some(
                self.inner
                    .fee
                    .attach(&self.inner.scheduler, self.inner.bridge.clone()),
            );
        }
        drop(subscription);
        self.inner.scheduler.start_auto_refresh();
    }

    /// Stop polling and drop the gas price subscription
    pub async fn unmount(&self) {
        if let Some(subscription) = self.inner.gas_subscription.lock().await.take() {
            subscription.unsubscribe();
        }
        self.inner.scheduler.stop_auto_refresh();
    }

    // ─── Network groups ──────────────────────────────────────────────────────

    pub async fn active_group_key(&self) -> String {
        self.inner.active_group.read().await.clone()
    }

    pub async fn active_group(&self) -> NetworkGroup {
        let key = self.active_group_key().await;
        match self.inner.registry.group(&key) {
            Ok(group) => group.clone(),
            Err(_) => self.inner.registry.default_group().clone(),
        }
    }

    /// Activate another network group and reset the bridge form
    pub async fn switch_group(&self, key: &str) -> Result<(), ContextError> {
        let group = self.inner.registry.group(key)?;
        {
            let mut active = self.inner.active_group.write().await;
            if *active == key {
                return Ok(());
            }
            *active = key.to_string();
        }
        tracing::info!(group = %key, "Network group changed");

        self.inner.bridge.write().await.on_network_group_changed(group);
        self.sync_fee_context().await;
        Ok(())
    }

    /// Networks of the active group, L1 first
    pub async fn network_list(&self) -> Vec<Network> {
        let group = self.active_group().await;
        group.network_list().into_iter().cloned().collect()
    }

    /// Destination choices for the current source
    pub async fn to_network_options(&self) -> Vec<Network> {
        let group = self.active_group().await;
        let bridge = self.inner.bridge.read().await;
        bridge
            .to_network_options(&group)
            .into_iter()
            .cloned()
            .collect()
    }

    // ─── Bridge form ─────────────────────────────────────────────────────────

    pub async fn bridge_state(&self) -> BridgeState {
        self.inner.bridge.read().await.clone()
    }

    /// Reject ids that are unknown or belong to another network group
    async fn ensure_in_active_group(&self, chain_id: ChainId) -> Result<(), ContextError> {
        self.inner.registry.network(chain_id)?;
        let group = self.active_group().await;
        if !group.contains(chain_id) {
            return Err(SelectionError::OutsideGroup {
                chain_id,
                group: group.key,
            }
            .into());
        }
        Ok(())
    }

    pub async fn select_from_network(&self, chain_id: ChainId) -> Result<(), ContextError> {
        self.ensure_in_active_group(chain_id).await?;
        self.inner.bridge.write().await.select_from_network(chain_id);
        self.sync_fee_context().await;
        Ok(())
    }

    pub async fn select_to_network(&self, chain_id: ChainId) -> Result<(), ContextError> {
        self.ensure_in_active_group(chain_id).await?;
        self.inner.bridge.write().await.select_to_network(chain_id)?;
        self.sync_fee_context().await;
        Ok(())
    }

    pub async fn swap_networks(&self) {
        self.inner.bridge.write().await.swap_networks();
        self.sync_fee_context().await;
    }

    pub async fn select_token(&self, token: Option<Token>) {
        self.inner.bridge.write().await.select_token(token);
    }

    pub async fn set_transfer_amount(&self, amount: Option<Amount>) {
        self.inner.bridge.write().await.set_transfer_amount(amount);
    }

    /// Fill the amount from a quick-select button
    pub async fn set_percentage_amount(&self, percentage: Percentage) -> Option<Amount> {
        let mut bridge = self.inner.bridge.write().await;
        self.inner
            .fee
            .set_percentage_amount(&mut bridge, percentage)
            .await
    }

    /// Refetch the gas price if the route changed. Failures stay in the
    /// estimator state.
    async fn sync_fee_context(&self) {
        let bridge = self.bridge_state().await;
        if let Err(e) = self.inner.fee.sync_context(&bridge).await {
            tracing::debug!(error = %e, "Gas price refresh after selection change failed");
        }
    }

    // ─── Derived figures ─────────────────────────────────────────────────────

    pub async fn fee_snapshot(&self) -> FeeSnapshot {
        let bridge = self.bridge_state().await;
        self.inner.fee.snapshot(&bridge).await
    }

    pub async fn percentage_amounts(&self) -> PercentageAmounts {
        let bridge = self.bridge_state().await;
        self.inner.fee.percentage_amounts(&bridge).await
    }

    pub async fn bridge_action(&self) -> BridgeAction {
        let bridge = self.bridge_state().await;
        let fee = self.inner.fee.fee(&bridge).await;
        bridge_action_state(&bridge, fee, &self.inner.registry)
    }

    pub async fn formatted_balance(&self) -> Option<String> {
        let connected = self.is_connected().await;
        let bridge = self.bridge_state().await;
        formatted_balance(connected, bridge.token_to_transfer())
    }

    // ─── Wallet ──────────────────────────────────────────────────────────────

    pub async fn wallet(&self) -> Option<WalletState> {
        self.inner.wallet.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.wallet.read().await.is_some()
    }

    /// Record a connected wallet after validating its address
    pub async fn connect_wallet(&self, address: &str) -> Result<(), ContextError> {
        let address = validate_evm_address(address)?;
        tracing::info!(address = %address, "Wallet connected");
        *self.inner.wallet.write().await = Some(WalletState::new(address));
        Ok(())
    }

    pub async fn disconnect_wallet(&self) {
        if self.inner.wallet.write().await.take().is_some() {
            tracing::info!("Wallet disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use portal_core::constants::{L1_ETH_ADDRESS, L2_BASE_TOKEN_ADDRESS};
    use portal_core::FeeError;

    const ETH: u128 = 1_000_000_000_000_000_000;
    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";

    struct FixedGasPrice {
        price: u128,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GasPriceSource for FixedGasPrice {
        async fn gas_price(&self, _chain_id: ChainId) -> Result<u128, FeeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.price)
        }
    }

    fn context(price: u128) -> (AppContext, Arc<FixedGasPrice>) {
        let source = Arc::new(FixedGasPrice {
            price,
            calls: AtomicUsize::new(0),
        });
        let context = AppContext::with_gas_source(AppConfig::default(), source.clone()).unwrap();
        (context, source)
    }

    fn eth(amount: Amount) -> Token {
        Token {
            l1_address: Address::new(L1_ETH_ADDRESS),
            l2_address: Address::new(L2_BASE_TOKEN_ADDRESS),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            usd_price: Some(3000.0),
            liquidity: None,
            icon_url: None,
            l1_token: true,
            amount: Some(amount),
            usd_balance: None,
            native: false,
        }
    }

    #[test]
    fn test_validate_evm_address() {
        assert!(validate_evm_address(WALLET).is_ok());
        assert!(validate_evm_address("742d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_err());
        assert!(validate_evm_address("0x742d").is_err());
        assert!(validate_evm_address("0xZZ2d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_err());
    }

    #[tokio::test]
    async fn test_wallet_session() {
        let (context, _) = context(1);
        assert!(!context.is_connected().await);

        let err = context.connect_wallet("not-an-address").await.unwrap_err();
        assert!(matches!(err, ContextError::InvalidAddress { .. }));

        context.connect_wallet(WALLET).await.unwrap();
        assert_eq!(context.wallet().await.unwrap().address.as_str(), WALLET);

        context.disconnect_wallet().await;
        assert!(context.wallet().await.is_none());
    }

    #[tokio::test]
    async fn test_selection_refreshes_fee() {
        let (context, source) = context(1);
        context.select_to_network(324).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        context.select_token(Some(eth(ETH))).await;
        context.set_transfer_amount(Some(ETH / 2)).await;

        let snapshot = context.fee_snapshot().await;
        assert_eq!(snapshot.fee, Some(230_000));
        let action = context.bridge_action().await;
        assert_eq!(action.message, "deposit ETH");
        assert!(!action.disabled);
    }

    #[tokio::test]
    async fn test_unknown_network_rejected() {
        let (context, _) = context(1);
        let err = context.select_to_network(424_242).await.unwrap_err();
        assert!(matches!(
            err,
            ContextError::Network(NetworkError::NotFound { chain_id: 424_242 })
        ));

        let err = context.select_to_network(1).await.unwrap_err();
        assert!(matches!(err, ContextError::Selection(_)));
    }

    #[tokio::test]
    async fn test_network_from_other_group_rejected() {
        let (context, source) = context(1);
        assert_eq!(context.active_group_key().await, "mainnet");

        let err = context.select_from_network(300).await.unwrap_err();
        assert!(matches!(
            err,
            ContextError::Selection(SelectionError::OutsideGroup { chain_id: 300, .. })
        ));
        let err = context.select_to_network(300).await.unwrap_err();
        assert!(matches!(
            err,
            ContextError::Selection(SelectionError::OutsideGroup { chain_id: 300, .. })
        ));

        let bridge = context.bridge_state().await;
        assert_eq!(bridge.from_network_id(), Some(1));
        assert_eq!(bridge.to_network_id(), None);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        context.select_token(Some(eth(ETH))).await;
        context.set_transfer_amount(Some(1_000)).await;
        let action = context.bridge_action().await;
        assert_eq!(action.message, "Select destination");
        assert!(action.disabled);

        context.switch_group("testnet").await.unwrap();
        context.select_from_network(300).await.unwrap();
        assert!(context.select_to_network(1).await.is_err());
        context.select_to_network(11_155_111).await.unwrap();
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let mut config = AppConfig::default();
        config.refresh.interval_ms = 0;
        let source = Arc::new(FixedGasPrice {
            price: 1,
            calls: AtomicUsize::new(0),
        });
        let err = AppContext::with_gas_source(config, source).err().unwrap();
        assert!(matches!(
            err,
            ContextError::Config(ConfigError::InvalidRefreshInterval { interval_ms: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_switch_group_resets_bridge() {
        let (context, _) = context(1);
        context.select_to_network(324).await.unwrap();
        context.select_token(Some(eth(ETH))).await;

        context.switch_group("testnet").await.unwrap();

        assert_eq!(context.active_group_key().await, "testnet");
        let bridge = context.bridge_state().await;
        assert_eq!(bridge.from_network_id(), Some(11_155_111));
        assert_eq!(bridge.to_network_id(), None);
        assert!(bridge.token_to_transfer().is_none());

        let ids: Vec<ChainId> = context.network_list().await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![11_155_111, 300, 32_657]);
        let ids: Vec<ChainId> = context
            .to_network_options()
            .await
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![300, 32_657]);

        assert!(context.switch_group("devnet").await.is_err());
        assert_eq!(context.active_group_key().await, "testnet");
    }

    #[tokio::test]
    async fn test_percentage_and_balance() {
        let (context, _) = context(1);
        context.select_to_network(324).await.unwrap();
        context.select_token(Some(eth(1_230_000))).await;

        assert_eq!(
            context.set_percentage_amount(Percentage::Max).await,
            Some(1_000_000)
        );
        assert_eq!(context.bridge_state().await.transfer_amount(), Some(1_000_000));
        assert_eq!(context.percentage_amounts().await.half, Some(500_000));

        assert_eq!(context.formatted_balance().await, None);
        context.connect_wallet(WALLET).await.unwrap();
        assert_eq!(
            context.formatted_balance().await.as_deref(),
            Some("<0.000001 ETH")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_polls_gas_price() {
        let (context, source) = context(1);
        context.select_to_network(324).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        context.mount().await;
        context.mount().await;
        assert_eq!(context.scheduler().subscribers().len(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        context.unmount().await;
        assert!(!context.scheduler().is_running());
        assert!(context.scheduler().subscribers().is_empty());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }
}
