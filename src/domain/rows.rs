//! Row types of the ledger lists

use serde::{Deserialize, Serialize};

use super::keys::{EntityId, Timestamp};
use super::{Keyed, TabularRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub consensus_timestamp: Timestamp,
    pub transaction_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub charged_tx_fee: u64,
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

impl Keyed for Transaction {
    type Key = Timestamp;

    fn key(&self) -> Timestamp {
        self.consensus_timestamp
    }
}

impl TabularRow for Transaction {
    fn columns() -> &'static [&'static str] {
        &["timestamp", "transaction id", "type", "result", "fee"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.consensus_timestamp.to_utc_string(),
            self.transaction_id.clone(),
            self.name.clone(),
            self.result.clone(),
            format_tinybars(self.charged_tx_fee),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account: EntityId,
    #[serde(default)]
    pub balance: Option<AccountBalance>,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub created_timestamp: Option<Timestamp>,
}

impl Keyed for Account {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.account
    }
}

impl TabularRow for Account {
    fn columns() -> &'static [&'static str] {
        &["account", "balance", "created", "memo"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.account.to_string(),
            self.balance
                .as_ref()
                .map(|balance| format_tinybars(balance.balance))
                .unwrap_or_default(),
            self.created_timestamp
                .map(|ts| ts.to_utc_string())
                .unwrap_or_default(),
            self.memo.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_id: EntityId,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub token_type: String,
}

impl Keyed for Token {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.token_id
    }
}

impl TabularRow for Token {
    fn columns() -> &'static [&'static str] {
        &["token", "symbol", "name", "type"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.token_id.to_string(),
            self.symbol.clone(),
            self.name.clone(),
            self.token_type.clone(),
        ]
    }
}

/// One account's balance of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolder {
    pub account: EntityId,
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub decimals: u32,
}

impl Keyed for TokenHolder {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.account
    }
}

impl TabularRow for TokenHolder {
    fn columns() -> &'static [&'static str] {
        &["account", "balance"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.account.to_string(), format_units(self.balance, self.decimals)]
    }
}

/// 1 hbar = 100_000_000 tinybars
pub fn format_tinybars(tinybars: u64) -> String {
    format!("{} ℏ", format_units(tinybars, 8))
}

fn format_units(amount: u64, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let Some(scale) = 10u64.checked_pow(decimals) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
