//! Synthetic ledger for `--demo` mode

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::{Account, AccountBalance, EntityId, Timestamp, Token, TokenHolder, Transaction};
use crate::infrastructure::memory::MemorySource;

const GENESIS_SECONDS: u64 = 1_693_400_000;
const TX_KINDS: [&str; 5] = [
    "CRYPTOTRANSFER",
    "CONSENSUSSUBMITMESSAGE",
    "TOKENMINT",
    "CONTRACTCALL",
    "CRYPTOCREATEACCOUNT",
];

/// In-memory lists with deterministic content
pub struct DemoLedger {
    pub transactions: Arc<MemorySource<Transaction>>,
    pub accounts: Arc<MemorySource<Account>>,
    pub tokens: Arc<MemorySource<Token>>,
    holders: Vec<(EntityId, Arc<MemorySource<TokenHolder>>)>,
}

impl DemoLedger {
    pub fn new(transaction_count: u64) -> Self {
        let transactions = (0..transaction_count).map(demo_transaction).collect();
        let accounts = (1..=240).map(demo_account).collect();
        let tokens: Vec<Token> = (1..=35).map(demo_token).collect();
        let holders = tokens
            .iter()
            .map(|token| {
                let num = token.token_id.num;
                let rows = (0..(num % 7) * 9 + 3)
                    .map(|i| TokenHolder {
                        account: EntityId::new(0, 0, 1_000 + i * 13 + num),
                        balance: (i + 1) * 1_250 + num,
                        decimals: 2,
                    })
                    .collect();
                (token.token_id, Arc::new(MemorySource::new(rows)))
            })
            .collect();

        Self {
            transactions: Arc::new(MemorySource::new(transactions)),
            accounts: Arc::new(MemorySource::new(accounts)),
            tokens: Arc::new(MemorySource::new(tokens)),
            holders,
        }
    }

    /// Holder list of `token`; unanswerable without a token
    pub fn holders(&self, token: Option<EntityId>) -> Arc<MemorySource<TokenHolder>> {
        token
            .and_then(|token| {
                self.holders
                    .iter()
                    .find(|(id, _)| *id == token)
                    .map(|(_, source)| Arc::clone(source))
            })
            .unwrap_or_else(|| match token {
                Some(_) => Arc::new(MemorySource::new(Vec::new())),
                None => Arc::new(MemorySource::unavailable()),
            })
    }

    /// Transactions limited to one account
    pub fn account_transactions(&self, account: EntityId) -> Arc<MemorySource<Transaction>> {
        let count = self.transactions.len() as u64;
        let rows = (0..count)
            .map(demo_transaction)
            .filter(|tx| tx.entity_id == Some(account))
            .collect();
        Arc::new(MemorySource::new(rows))
    }

    /// Append a new transaction every `period` so the live view has
    /// something to show
    pub fn spawn_growth(&self, period: Duration) -> JoinHandle<()> {
        let transactions = Arc::clone(&self.transactions);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let next = transactions.len() as u64;
                transactions.insert(demo_transaction(next));
                debug!(seq = next, "demo transaction appended");
            }
        })
    }
}

fn demo_transaction(seq: u64) -> Transaction {
    let payer = 1_000 + seq % 240;
    Transaction {
        consensus_timestamp: Timestamp::new(GENESIS_SECONDS + seq * 3, (seq * 7_919 % 1_000) as u32),
        transaction_id: format!("0.0.{payer}-{}-{:09}", GENESIS_SECONDS + seq * 3 - 2, seq),
        name: TX_KINDS[(seq % TX_KINDS.len() as u64) as usize].to_string(),
        result: if seq % 17 == 0 {
            "INSUFFICIENT_PAYER_BALANCE".to_string()
        } else {
            "SUCCESS".to_string()
        },
        charged_tx_fee: 80_000 + (seq * 131) % 9_000,
        entity_id: Some(EntityId::new(0, 0, demo_account_num(seq))),
    }
}

fn demo_account_num(seq: u64) -> u64 {
    1 + seq % 240
}

fn demo_account(num: u64) -> Account {
    Account {
        account: EntityId::new(0, 0, num),
        balance: Some(AccountBalance {
            balance: num * 97_000_000 % 1_000_000_000_000,
            timestamp: None,
        }),
        memo: if num % 10 == 0 {
            format!("treasury {num}")
        } else {
            String::new()
        },
        created_timestamp: Some(Timestamp::new(GENESIS_SECONDS - 86_400 + num * 60, 0)),
    }
}

fn demo_token(num: u64) -> Token {
    let id = 5_000 + num;
    Token {
        token_id: EntityId::new(0, 0, id),
        symbol: format!("DEMO{num}"),
        name: format!("Demo token {num}"),
        token_type: if num % 4 == 0 {
            "NON_FUNGIBLE_UNIQUE".to_string()
        } else {
            "FUNGIBLE_COMMON".to_string()
        },
    }
}
