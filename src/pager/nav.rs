//! Navigation state - the persisted `{page, key}` projection of a table
//!
//! A table in pagination mode writes its page number and the key of its
//! first visible row after every move, and reads them back on mount. Any
//! key-value store can hold them; [`QueryState`] keeps them as a query string
//! so they can travel inside a `ledgerscope://` link.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use reqwest::Url;
use thiserror::Error;

pub const LINK_SCHEME: &str = "ledgerscope";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("page must be a positive integer, got {0:?}")]
    InvalidPage(String),
    #[error("invalid link {link:?}: {reason}")]
    InvalidLink { link: String, reason: String },
}

/// Key-value storage for navigation parameters
pub trait NavStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: Option<String>);
}

/// Names of the two parameters a table persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavParams {
    pub page: String,
    pub key: String,
}

impl Default for NavParams {
    fn default() -> Self {
        Self {
            page: "p".to_string(),
            key: "k".to_string(),
        }
    }
}

/// Navigation parameters as read from a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    pub page: Option<usize>,
    pub key: Option<String>,
}

impl NavState {
    pub fn read(store: &dyn NavStore, params: &NavParams) -> Result<Self, NavError> {
        let page = store
            .get(&params.page)
            .map(|raw| parse_page(&raw))
            .transpose()?;
        let key = store.get(&params.key).filter(|key| !key.is_empty());
        Ok(Self { page, key })
    }

    pub fn write(&self, store: &dyn NavStore, params: &NavParams) {
        store.set(&params.page, self.page.map(|page| page.to_string()));
        store.set(&params.key, self.key.clone());
    }

    /// Both parameters present: the table should open in pagination mode
    pub fn is_anchored(&self) -> bool {
        self.page.is_some() && self.key.is_some()
    }
}

/// Largest page number accepted from links and commands
pub const MAX_PAGE: usize = u32::MAX as usize;

pub fn parse_page(raw: &str) -> Result<usize, NavError> {
    match raw.trim().parse::<usize>() {
        Ok(page) if (1..=MAX_PAGE).contains(&page) => Ok(page),
        _ => Err(NavError::InvalidPage(raw.to_string())),
    }
}

/// In-memory query string
#[derive(Debug, Default)]
pub struct QueryState {
    params: Mutex<BTreeMap<String, String>>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `p=3&k=...` (a leading `?` is allowed)
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = BTreeMap::new();
        if let Ok(mut url) = Url::parse(&format!("{LINK_SCHEME}://query/")) {
            url.set_query(Some(query));
            for (name, value) in url.query_pairs() {
                params.insert(name.into_owned(), value.into_owned());
            }
        }
        Self {
            params: Mutex::new(params),
        }
    }

    pub fn to_query_string(&self) -> String {
        let params = self.params.lock();
        if params.is_empty() {
            return String::new();
        }
        let Ok(mut url) = Url::parse(&format!("{LINK_SCHEME}://query/")) else {
            return String::new();
        };
        url.query_pairs_mut().extend_pairs(params.iter());
        url.query().unwrap_or_default().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.params.lock().is_empty()
    }
}

impl Clone for QueryState {
    fn clone(&self) -> Self {
        Self {
            params: Mutex::new(self.params.lock().clone()),
        }
    }
}

impl NavStore for QueryState {
    fn get(&self, name: &str) -> Option<String> {
        self.params.lock().get(name).cloned()
    }

    fn set(&self, name: &str, value: Option<String>) {
        let mut params = self.params.lock();
        match value {
            Some(value) => {
                params.insert(name.to_string(), value);
            }
            None => {
                params.remove(name);
            }
        }
    }
}

/// A shareable `ledgerscope://<table>?<query>` link
#[derive(Debug, Clone)]
pub struct Link {
    pub table: String,
    pub query: QueryState,
}

impl Link {
    pub fn new(table: impl Into<String>, query: QueryState) -> Self {
        Self {
            table: table.into(),
            query,
        }
    }

    pub fn parse(link: &str) -> Result<Self, NavError> {
        let invalid = |reason: &str| NavError::InvalidLink {
            link: link.to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(link.trim()).map_err(|err| invalid(&err.to_string()))?;
        if url.scheme() != LINK_SCHEME {
            return Err(invalid("unsupported scheme"));
        }
        let table = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid("missing table name"))?;
        Ok(Self {
            table: table.to_string(),
            query: QueryState::parse(url.query().unwrap_or_default()),
        })
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let query = self.query.to_query_string();
        if query.is_empty() {
            write!(f, "{LINK_SCHEME}://{}", self.table)
        } else {
            write!(f, "{LINK_SCHEME}://{}?{}", self.table, query)
        }
    }
}
