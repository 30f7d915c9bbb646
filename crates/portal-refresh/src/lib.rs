//! portal-refresh: Coordinated polling for on-chain data
//!
//! Every data fetcher (gas price, balances, quotes) subscribes to one shared
//! [`RefreshScheduler`] so they all refresh on the same 10 second cycle and
//! the UI can show a single countdown.

pub mod scheduler;

pub use scheduler::{
    CallbackError, CycleOutcome, RefreshFuture, RefreshScheduler, RefreshStatus, SubscriberInfo,
    Subscription, DEFAULT_REFRESH_INTERVAL,
};
