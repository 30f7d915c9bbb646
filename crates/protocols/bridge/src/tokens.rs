//! Token list helpers
//!
//! Token lists come from the block explorer of each L2. The L1 group is
//! synthesised from the L1 addresses of those lists, and balances fetched
//! elsewhere are overlaid onto them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use portal_core::format::token_balance_price_raw;
use portal_core::{Address, Amount, Token};

/// Balance of one token held by the connected account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// L1 address for L1 balances, L2 address otherwise
    pub address: Address,
    pub amount: Amount,
    /// Fiat value reported by the balance provider, if any
    #[serde(default)]
    pub usd_balance: Option<f64>,
}

/// Index tokens by lowercased L2 address. The first entry wins on duplicates.
pub fn tokens_by_l2_address(tokens: &[Token]) -> HashMap<String, &Token> {
    let mut index = HashMap::with_capacity(tokens.len());
    for token in tokens {
        index.entry(token.l2_address.normalized()).or_insert(token);
    }
    index
}

/// Distinct L1 tokens across all L2 token lists, flagged as L1 tokens
pub fn l1_tokens<'a>(lists: impl IntoIterator<Item = &'a [Token]>) -> Vec<Token> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|t| !t.l1_address.as_str().is_empty())
        .filter(|t| seen.insert(t.l1_address.normalized()))
        .map(|t| Token {
            l1_token: true,
            ..t.clone()
        })
        .collect()
}

/// Overlay account balances onto a token list.
///
/// L1 tokens match on their L1 address, others on their L2 address. Zero
/// balances leave the token untouched. Without a provider value the fiat
/// balance is derived from the token's USD price.
pub fn apply_balances(tokens: &[Token], balances: &[TokenBalance]) -> Vec<Token> {
    let by_address: HashMap<String, &TokenBalance> = balances
        .iter()
        .map(|b| (b.address.normalized(), b))
        .collect();

    tokens
        .iter()
        .map(|token| {
            let key = if token.l1_token {
                token.l1_address.normalized()
            } else {
                token.l2_address.normalized()
            };
            match by_address.get(&key) {
                Some(balance) if balance.amount > 0 => {
                    let usd_balance = balance.usd_balance.or_else(|| {
                        token
                            .usd_price
                            .map(|price| token_balance_price_raw(balance.amount, token.decimals, price))
                    });
                    Token {
                        amount: Some(balance.amount),
                        usd_balance,
                        ..token.clone()
                    }
                }
                _ => token.clone(),
            }
        })
        .collect()
}
