//! Mirror node lists exposed as table sources

use std::marker::PhantomData;

use anyhow::Result;
use serde::de::DeserializeOwned;

use crate::domain::{Account, EntityId, Keyed, TableFilter, Token, TokenHolder, Transaction};
use crate::infrastructure::mirror::client::{ListQuery, MirrorClient};
use crate::pager::{Operator, SortOrder, TableSource};

/// A mirror node list endpoint of rows `R`
pub struct MirrorSource<R> {
    client: MirrorClient,
    /// `None` when a mandatory path parameter is missing
    path: Option<String>,
    field: &'static str,
    key_param: &'static str,
    filters: Vec<(String, String)>,
    _row: PhantomData<fn() -> R>,
}

impl<R> MirrorSource<R> {
    fn new(client: MirrorClient, path: Option<String>, field: &'static str, key_param: &'static str) -> Self {
        Self {
            client,
            path,
            field,
            key_param,
            filters: Vec::new(),
            _row: PhantomData,
        }
    }

    fn with_filter(mut self, name: &str, value: Option<EntityId>) -> Self {
        if let Some(value) = value {
            self.filters.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl MirrorSource<Transaction> {
    pub fn transactions(client: MirrorClient, filter: &TableFilter) -> Self {
        Self::new(
            client,
            Some("/api/v1/transactions".to_string()),
            "transactions",
            "timestamp",
        )
        .with_filter("account.id", filter.account)
    }
}

impl MirrorSource<Account> {
    pub fn accounts(client: MirrorClient) -> Self {
        Self::new(client, Some("/api/v1/accounts".to_string()), "accounts", "account.id")
    }
}

impl MirrorSource<Token> {
    pub fn tokens(client: MirrorClient) -> Self {
        Self::new(client, Some("/api/v1/tokens".to_string()), "tokens", "token.id")
    }
}

impl MirrorSource<TokenHolder> {
    /// Holders of `token`; without a token every query is unanswerable
    pub fn holders(client: MirrorClient, filter: &TableFilter) -> Self {
        let path = filter
            .token
            .map(|token| format!("/api/v1/tokens/{token}/balances"));
        Self::new(client, path, "balances", "account.id")
    }
}

#[async_trait::async_trait]
impl<R> TableSource for MirrorSource<R>
where
    R: Keyed + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Row = R;
    type Key = R::Key;

    fn key_for(&self, row: &R) -> R::Key {
        row.key()
    }

    fn key_to_string(&self, key: &R::Key) -> String {
        key.to_string()
    }

    fn key_from_string(&self, value: &str) -> Option<R::Key> {
        value.parse().ok()
    }

    async fn load(
        &self,
        key: Option<&R::Key>,
        operator: Operator,
        order: SortOrder,
        limit: usize,
    ) -> Result<Option<Vec<R>>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        let query = ListQuery {
            path,
            key_param: self.key_param,
            key: key.map(|key| key.to_string()),
            operator,
            order,
            limit,
            filters: &self.filters,
        };
        self.client.list(&query, self.field).await
    }
}
