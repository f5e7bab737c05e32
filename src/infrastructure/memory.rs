//! In-memory table source

use anyhow::Result;
use parking_lot::RwLock;

use crate::domain::Keyed;
use crate::pager::{Operator, SortOrder, TableSource};

/// Rows held in memory, newest (highest key) first.
///
/// Answers queries the same way a mirror node does. A source built with
/// [`MemorySource::unavailable`] answers every query with `None`.
#[derive(Debug)]
pub struct MemorySource<R> {
    rows: RwLock<Vec<R>>,
    available: bool,
}

impl<R: Keyed + Clone> MemorySource<R> {
    pub fn new(mut rows: Vec<R>) -> Self {
        rows.sort_by_key(|row| std::cmp::Reverse(row.key()));
        rows.dedup_by_key(|row| row.key());
        Self {
            rows: RwLock::new(rows),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            available: false,
        }
    }

    /// Insert a row at its place in the order; a row with the same key is replaced
    pub fn insert(&self, row: R) {
        let mut rows = self.rows.write();
        let key = row.key();
        match rows.binary_search_by(|probe| key.cmp(&probe.key())) {
            Ok(index) => rows[index] = row,
            Err(index) => rows.insert(index, row),
        }
    }

    pub fn remove(&self, key: &R::Key) -> Option<R> {
        let mut rows = self.rows.write();
        let index = rows.iter().position(|row| &row.key() == key)?;
        Some(rows.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Newest row
    pub fn head(&self) -> Option<R> {
        self.rows.read().first().cloned()
    }
}

#[async_trait::async_trait]
impl<R> TableSource for MemorySource<R>
where
    R: Keyed + Clone + Send + Sync + 'static,
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
        if !self.available {
            return Ok(None);
        }
        let rows = self.rows.read();
        let matching = rows
            .iter()
            .filter(|row| key.map_or(true, |bound| operator.accepts(&row.key(), bound)));
        let selected: Vec<R> = match order {
            SortOrder::Desc => matching.take(limit).cloned().collect(),
            SortOrder::Asc => {
                let mut ascending: Vec<R> = matching.cloned().collect();
                ascending.reverse();
                ascending.truncate(limit);
                ascending
            }
        };
        Ok(Some(selected))
    }
}
