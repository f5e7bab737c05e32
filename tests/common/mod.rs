//! Scripted in-memory source shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use ledgerscope::pager::{Operator, SortOrder, TableSource};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// One query seen by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub key: Option<u64>,
    pub operator: Operator,
    pub order: SortOrder,
    pub limit: usize,
}

/// Integer rows (the row is its own key), newest = largest first.
///
/// Loads can be held at a gate, made to fail, or made to answer `None`.
#[derive(Default)]
pub struct ScriptedSource {
    rows: Mutex<Vec<u64>>,
    calls: Mutex<Vec<Call>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    failing: AtomicBool,
    null: AtomicBool,
}

impl ScriptedSource {
    /// Rows `count, count - 1, ..., 1`
    pub fn with_rows(count: u64) -> Arc<Self> {
        let source = Self::default();
        *source.rows.lock() = (1..=count).rev().collect();
        Arc::new(source)
    }

    /// Add a row newer than every existing one
    pub fn push(&self, row: u64) {
        let mut rows = self.rows.lock();
        rows.insert(0, row);
        rows.sort_unstable_by(|a, b| b.cmp(a));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_null(&self, null: bool) {
        self.null.store(null, Ordering::SeqCst);
    }

    /// Hold every following load until [`ScriptedSource::release`]
    pub fn close_gate(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `loads` held loads through
    pub fn release(&self, loads: usize) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(loads);
        }
    }
}

#[async_trait]
impl TableSource for ScriptedSource {
    type Row = u64;
    type Key = u64;

    fn key_for(&self, row: &u64) -> u64 {
        *row
    }

    fn key_to_string(&self, key: &u64) -> String {
        key.to_string()
    }

    fn key_from_string(&self, value: &str) -> Option<u64> {
        value.parse().ok()
    }

    async fn load(
        &self,
        key: Option<&u64>,
        operator: Operator,
        order: SortOrder,
        limit: usize,
    ) -> Result<Option<Vec<u64>>> {
        self.calls.lock().push(Call {
            key: key.copied(),
            operator,
            order,
            limit,
        });

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        if self.failing.load(Ordering::SeqCst) {
            bail!("scripted failure");
        }
        if self.null.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let rows = self.rows.lock().clone();
        let mut matching: Vec<u64> = rows
            .into_iter()
            .filter(|row| key.map_or(true, |key| operator.accepts(row, key)))
            .collect();
        if order == SortOrder::Asc {
            matching.reverse();
        }
        matching.truncate(limit);
        Ok(Some(matching))
    }
}
