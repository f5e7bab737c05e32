//! Row buffer - sliding window over a cursor-paginated source
//!
//! The buffer owns the committed [`Window`] inside a `watch` channel, so every
//! reader (page projection, UI worker) sees the latest commit. All network
//! traffic goes through three primitives: [`RowBuffer::head_load`],
//! [`RowBuffer::tail_load`] and [`RowBuffer::last_load`]. Operations built on
//! them fetch everything first and commit once, under the abort guard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

use crate::pager::guard::{AbortGuard, Ticket};
use crate::pager::nav::NavError;
use crate::pager::source::{Operator, SortOrder, TableSource};
use crate::pager::window::{concat_or_replace, Stitch, Window};

/// Result of a window operation that reached its commit point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The window now reflects the operation
    Committed,
    /// The operation went stale while loading and left the window alone
    Discarded,
}

impl LoadOutcome {
    pub fn is_committed(self) -> bool {
        self == LoadOutcome::Committed
    }
}

/// State captured before the first await of an operation
struct Plan<K> {
    ticket: Ticket,
    revision: u64,
    page_size: usize,
    len: usize,
    shadow: usize,
    drained: bool,
    head: Option<K>,
    tail: Option<K>,
}

/// A page move whose ticket and starting window were captured when it was
/// requested. Running it later cannot overtake a move requested after it.
pub struct PreparedMove<K> {
    plan: Plan<K>,
    page: usize,
    next_start: usize,
    next_end: usize,
}

impl<K> PreparedMove<K> {
    pub fn page(&self) -> usize {
        self.page
    }
}

/// Absolute `[start, end)` row range of `page`
fn page_bounds(page: usize, page_size: usize) -> Result<(usize, usize), NavError> {
    (page - 1)
        .checked_mul(page_size)
        .and_then(|start| start.checked_add(page_size).map(|end| (start, end)))
        .ok_or_else(|| NavError::InvalidPage(page.to_string()))
}

pub struct RowBuffer<S: TableSource> {
    source: Arc<S>,
    max_limit: usize,
    state: watch::Sender<Window<S::Row>>,
    guard: AbortGuard,
    /// Bumped by every commit; an operation planned against an older
    /// revision cannot commit even if nobody aborted it
    revision: AtomicU64,
}

impl<S: TableSource> RowBuffer<S> {
    pub fn new(source: Arc<S>, page_size: usize, max_limit: usize) -> Self {
        let (state, _) = watch::channel(Window::new(page_size));
        Self {
            source,
            max_limit: max_limit.max(1),
            state,
            guard: AbortGuard::new(),
            revision: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    pub fn page_size(&self) -> usize {
        self.state.borrow().page_size
    }

    /// Snapshot of the committed window
    pub fn window(&self) -> Window<S::Row> {
        self.state.borrow().clone()
    }

    /// Read the committed window without cloning it
    pub fn with_window<T>(&self, read: impl FnOnce(&Window<S::Row>) -> T) -> T {
        read(&self.state.borrow())
    }

    /// Rows of the visible page
    pub fn page_rows(&self) -> Vec<S::Row> {
        self.state.borrow().page_rows().to_vec()
    }

    /// Receiver notified after every commit
    pub fn subscribe(&self) -> watch::Receiver<Window<S::Row>> {
        self.state.subscribe()
    }

    /// Make every in-flight operation stale
    pub fn abort(&self) {
        self.guard.abort();
        debug!("window operations aborted");
    }

    /// Number of completions dropped because they went stale
    pub fn discarded_count(&self) -> usize {
        self.guard.discarded()
    }

    /// Abort in-flight work and forget every row
    pub fn clear(&self) {
        self.guard.abort();
        self.state.send_modify(|window| {
            window.reset();
            self.revision.fetch_add(1, Ordering::SeqCst);
        });
        debug!("window cleared");
    }

    pub fn set_page_size(&self, page_size: usize) {
        let page_size = page_size.max(1);
        self.state.send_modify(|window| {
            window.page_size = page_size;
            window.start_index = window.start_index.min(window.rows.len());
            self.revision.fetch_add(1, Ordering::SeqCst);
        });
    }

    /// Rows strictly newer than `key`, oldest first.
    ///
    /// Fetches in chunks of at most `max_limit` rows and keeps going while
    /// the previous chunk came back full.
    pub async fn head_load(&self, key: &S::Key, row_count: usize) -> Result<Vec<S::Row>> {
        let mut rows = Vec::new();
        let mut cursor = key.clone();
        while rows.len() < row_count {
            let limit = (row_count - rows.len()).min(self.max_limit);
            let mut chunk = self
                .source
                .load(Some(&cursor), Operator::Gt, SortOrder::Asc, limit)
                .await?
                .unwrap_or_default();
            chunk.truncate(limit);
            debug!(limit, loaded = chunk.len(), "head chunk");
            let full = chunk.len() == limit;
            if let Some(last) = chunk.last() {
                cursor = self.source.key_for(last);
            }
            rows.extend(chunk);
            if !full {
                break;
            }
        }
        Ok(rows)
    }

    /// Rows older than `key` (or at-or-older when `inclusive`), newest first.
    ///
    /// `key = None` starts from the newest row. Returns fewer than
    /// `row_count` rows exactly when the source ran out.
    pub async fn tail_load(
        &self,
        key: Option<&S::Key>,
        row_count: usize,
        inclusive: bool,
    ) -> Result<Vec<S::Row>> {
        let mut rows = Vec::new();
        let mut cursor = key.cloned();
        let mut operator = if inclusive { Operator::Lte } else { Operator::Lt };
        while rows.len() < row_count {
            let limit = (row_count - rows.len()).min(self.max_limit);
            let mut chunk = self
                .source
                .load(cursor.as_ref(), operator, SortOrder::Desc, limit)
                .await?
                .unwrap_or_default();
            chunk.truncate(limit);
            debug!(limit, loaded = chunk.len(), %operator, "tail chunk");
            let full = chunk.len() == limit;
            if let Some(last) = chunk.last() {
                cursor = Some(self.source.key_for(last));
            }
            operator = Operator::Lt;
            rows.extend(chunk);
            if !full {
                break;
            }
        }
        Ok(rows)
    }

    /// Newest rows at or above `key`, newest first, in a single fetch
    pub async fn last_load(&self, key: &S::Key, row_count: usize) -> Result<Vec<S::Row>> {
        let limit = row_count.clamp(1, self.max_limit);
        let mut rows = self
            .source
            .load(Some(key), Operator::Gte, SortOrder::Desc, limit)
            .await?
            .unwrap_or_default();
        rows.truncate(limit);
        debug!(limit, loaded = rows.len(), "last chunk");
        Ok(rows)
    }

    /// Position the window on `page` (1-based).
    ///
    /// With an anchor `key` the window is rebuilt starting at that row, which
    /// is taken to be the first row of `page`. Without one, the retained rows
    /// are reused and only the missing head or tail part is fetched.
    pub async fn move_to_page(&self, page: usize, key: Option<&S::Key>) -> Result<LoadOutcome> {
        let prepared = self.prepare_move(page)?;
        self.run_move(prepared, key).await
    }

    /// Capture the ticket and window a move to `page` starts from.
    ///
    /// Fails with [`NavError::InvalidPage`] when the page lies beyond the
    /// addressable row range.
    pub fn prepare_move(&self, page: usize) -> Result<PreparedMove<S::Key>, NavError> {
        let page = page.max(1);
        let plan = self.plan();
        let (next_start, next_end) = page_bounds(page, plan.page_size)?;
        Ok(PreparedMove {
            plan,
            page,
            next_start,
            next_end,
        })
    }

    /// Load what a prepared move is missing and commit it, unless a later
    /// operation made it stale
    pub async fn run_move(
        &self,
        prepared: PreparedMove<S::Key>,
        key: Option<&S::Key>,
    ) -> Result<LoadOutcome> {
        let PreparedMove {
            plan,
            page,
            next_start,
            next_end,
        } = prepared;
        let page_size = plan.page_size;

        if let Some(key) = key {
            let rows = self.tail_load(Some(key), page_size, true).await?;
            debug!(page, loaded = rows.len(), "anchored move");
            return Ok(self.commit(&plan, move |window| {
                window.drained = rows.len() < page_size;
                window.rows = rows;
                window.shadow_row_count = next_start;
                window.start_index = 0;
            }));
        }

        let (Some(head), Some(tail)) = (plan.head.as_ref(), plan.tail.as_ref()) else {
            let rows = self.tail_load(None, next_end, false).await?;
            debug!(page, loaded = rows.len(), "initial move");
            return Ok(self.commit(&plan, move |window| {
                window.drained = rows.len() < next_end;
                window.rows = rows;
                window.shadow_row_count = 0;
                window.start_index = window.clamp_start(next_start);
            }));
        };

        if next_start < plan.shadow {
            let wanted = plan.shadow - next_start;
            let loaded = self.head_load(head, wanted).await?;
            debug!(page, wanted, loaded = loaded.len(), "head move");
            return Ok(self.commit(&plan, move |window| {
                let reached_newest = loaded.len() < wanted;
                let count = loaded.len();
                let mut rows: Vec<S::Row> = loaded.into_iter().rev().collect();
                rows.append(&mut window.rows);
                window.rows = rows;
                window.shadow_row_count = if reached_newest {
                    0
                } else {
                    window.shadow_row_count - count
                };
                window.start_index = window.clamp_start(next_start);
            }));
        }

        let known = plan.shadow + plan.len;
        if next_end > known && !plan.drained {
            let shortfall = next_end - known;
            let loaded = self.tail_load(Some(tail), shortfall, false).await?;
            debug!(page, shortfall, loaded = loaded.len(), "tail move");
            return Ok(self.commit(&plan, move |window| {
                if loaded.len() < shortfall {
                    window.drained = true;
                }
                window.rows.extend(loaded);
                window.start_index = window.clamp_start(next_start);
            }));
        }

        Ok(self.commit(&plan, move |window| {
            window.start_index = window.clamp_start(next_start);
        }))
    }

    /// Re-anchor on the newest rows of the source.
    ///
    /// New rows above the current head are stitched on when the fresh run
    /// reaches down to the old head; otherwise the window is rebuilt from the
    /// fresh run alone.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let plan = self.plan();

        let head = match plan.head.as_ref() {
            Some(head) if plan.shadow == 0 => head,
            _ => {
                let page_size = plan.page_size;
                let rows = self.tail_load(None, page_size, false).await?;
                debug!(loaded = rows.len(), "refresh from newest");
                return Ok(self.commit(&plan, move |window| {
                    window.reset();
                    window.drained = rows.len() < page_size;
                    window.rows = rows;
                }));
            }
        };

        let fresh = self.last_load(head, self.max_limit).await?;
        let source = Arc::clone(&self.source);
        Ok(self.commit(&plan, move |window| {
            let current = std::mem::take(&mut window.rows);
            let (rows, stitch) = concat_or_replace(fresh, current, |row| source.key_for(row));
            match stitch {
                Stitch::Concatenated { added } => {
                    debug!(added, "refresh stitched");
                    window.rows = rows;
                }
                Stitch::Replaced => {
                    debug!(loaded = rows.len(), "refresh diverged, window replaced");
                    window.reset();
                    window.rows = rows;
                }
            }
        }))
    }

    fn plan(&self) -> Plan<S::Key> {
        let ticket = self.guard.ticket();
        let window = self.state.borrow();
        Plan {
            ticket,
            revision: self.revision.load(Ordering::SeqCst),
            page_size: window.page_size,
            len: window.rows.len(),
            shadow: window.shadow_row_count,
            drained: window.drained,
            head: window.rows.first().map(|row| self.source.key_for(row)),
            tail: window.rows.last().map(|row| self.source.key_for(row)),
        }
    }

    fn commit<F>(&self, plan: &Plan<S::Key>, apply: F) -> LoadOutcome
    where
        F: FnOnce(&mut Window<S::Row>),
    {
        let committed = self.state.send_if_modified(|window| {
            if !self.guard.is_current(plan.ticket)
                || self.revision.load(Ordering::SeqCst) != plan.revision
            {
                return false;
            }
            apply(window);
            self.revision.fetch_add(1, Ordering::SeqCst);
            true
        });

        if committed {
            LoadOutcome::Committed
        } else {
            self.guard.note_discarded();
            debug!("stale window operation discarded");
            LoadOutcome::Discarded
        }
    }
}

impl<S: TableSource> std::fmt::Debug for RowBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let window = self.state.borrow();
        f.debug_struct("RowBuffer")
            .field("rows", &window.rows.len())
            .field("start_index", &window.start_index)
            .field("shadow_row_count", &window.shadow_row_count)
            .field("drained", &window.drained)
            .field("page_size", &window.page_size)
            .field("max_limit", &self.max_limit)
            .finish()
    }
}
