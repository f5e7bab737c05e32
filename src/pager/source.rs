//! Row source contract used by the pagination engine

use std::fmt;

use anyhow::Result;

/// Comparison applied to the ordering key of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Query-string spelling used by mirror node filters (`gt:`, `lte:` ...)
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    /// Whether `candidate` satisfies this operator relative to `bound`
    pub fn accepts<K: Ord>(self, candidate: &K, bound: &K) -> bool {
        match self {
            Operator::Gt => candidate > bound,
            Operator::Gte => candidate >= bound,
            Operator::Lt => candidate < bound,
            Operator::Lte => candidate <= bound,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order of the rows returned by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cursor-paginated list of rows.
///
/// Sources know how to extract the ordering key of a row, how to persist a
/// key as a string (for navigation links), and how to run one bounded query.
/// The natural order of every list is descending by key.
#[async_trait::async_trait]
pub trait TableSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;
    type Key: Clone + Ord + fmt::Debug + Send + Sync + 'static;

    /// Ordering key of a row
    fn key_for(&self, row: &Self::Row) -> Self::Key;

    /// Lossless string form of a key
    fn key_to_string(&self, key: &Self::Key) -> String;

    /// Inverse of [`TableSource::key_to_string`]; `None` for malformed input
    fn key_from_string(&self, value: &str) -> Option<Self::Key>;

    /// Run one query.
    ///
    /// `key = None` with `SortOrder::Desc` starts from the newest row and
    /// ignores `operator`. Returned rows must be strictly ordered by key
    /// according to `order` and satisfy `operator` relative to `key`.
    ///
    /// `Ok(None)` means the query cannot be answered right now (a mandatory
    /// filter is missing, say). `Ok(Some(vec![]))` means the source has no
    /// rows past this boundary.
    async fn load(
        &self,
        key: Option<&Self::Key>,
        operator: Operator,
        order: SortOrder,
        limit: usize,
    ) -> Result<Option<Vec<Self::Row>>>;
}
