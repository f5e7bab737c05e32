//! Committed window state and its projections

/// Rows retained client-side plus the bookkeeping needed to place them in
/// the global (descending) order of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window<R> {
    /// Contiguous, gap-free run of rows, newest first
    pub rows: Vec<R>,
    /// Offset in `rows` where the visible page begins
    pub start_index: usize,
    /// Rows known to precede `rows[0]` that are not retained
    pub shadow_row_count: usize,
    /// The tail of `rows` is the oldest row of the source
    pub drained: bool,
    /// Rows per visible page
    pub page_size: usize,
}

/// How a freshly fetched head run was merged into the existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stitch {
    /// Runs shared a boundary row; `added` new rows now precede the old head
    Concatenated { added: usize },
    /// Runs did not meet; the old rows were dropped
    Replaced,
}

impl<R> Window<R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            start_index: 0,
            shadow_row_count: 0,
            drained: false,
            page_size: page_size.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of the visible page
    pub fn page_rows(&self) -> &[R] {
        let start = self.start_index.min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn first_visible(&self) -> Option<&R> {
        self.page_rows().first()
    }

    /// Absolute index of the first visible row
    pub fn absolute_start(&self) -> usize {
        self.shadow_row_count.saturating_add(self.start_index)
    }

    /// 1-based number of the visible page
    pub fn current_page(&self) -> usize {
        (self.absolute_start() / self.page_size).saturating_add(1)
    }

    /// Rows whose existence is known: the shadow plus the retained rows
    pub fn known_row_count(&self) -> usize {
        self.shadow_row_count.saturating_add(self.rows.len())
    }

    /// Row count shown to users.
    ///
    /// Exact once the window is drained. Before that it is a heuristic: the
    /// known count plus one, rounded up to a multiple of `presumed_row_count`.
    /// It only grows while more rows are discovered, but it is not a
    /// precision guarantee.
    pub fn total_row_count(&self, presumed_row_count: usize) -> usize {
        let known = self.known_row_count();
        if self.drained {
            return known;
        }
        let granularity = presumed_row_count.max(1);
        known
            .saturating_add(1)
            .div_ceil(granularity)
            .saturating_mul(granularity)
    }

    /// Number of pages implied by [`Window::total_row_count`], at least one
    pub fn page_count(&self, presumed_row_count: usize) -> usize {
        self.total_row_count(presumed_row_count)
            .div_ceil(self.page_size)
            .max(1)
    }

    /// Convert the desired absolute page start into an index into `rows`.
    ///
    /// A drained window clamps to the start of its last page; the result
    /// never exceeds `rows.len()`.
    pub(crate) fn clamp_start(&self, next_start: usize) -> usize {
        let mut start = next_start;
        if self.drained {
            let known = self.known_row_count();
            let last_page_start = if known == 0 {
                0
            } else {
                (known - 1) / self.page_size * self.page_size
            };
            start = start.min(last_page_start);
        }
        start
            .saturating_sub(self.shadow_row_count)
            .min(self.rows.len())
    }

    /// Drop every row and all position bookkeeping, keeping the page size
    pub(crate) fn reset(&mut self) {
        self.rows.clear();
        self.start_index = 0;
        self.shadow_row_count = 0;
        self.drained = false;
    }
}

/// Join `new_rows` (newest first) onto `current_rows`.
///
/// When the last key of `new_rows` equals the first key of `current_rows` the
/// two runs are contiguous in the source and are concatenated without the
/// duplicate boundary row. Anything else means the source moved in a way the
/// window cannot reconcile, and `new_rows` replaces the old rows.
pub fn concat_or_replace<R, K, F>(
    mut new_rows: Vec<R>,
    current_rows: Vec<R>,
    key_for: F,
) -> (Vec<R>, Stitch)
where
    K: PartialEq,
    F: Fn(&R) -> K,
{
    let shares_boundary = match (new_rows.last(), current_rows.first()) {
        (Some(last_new), Some(first_current)) => key_for(last_new) == key_for(first_current),
        _ => false,
    };

    if !shares_boundary {
        return (new_rows, Stitch::Replaced);
    }

    new_rows.pop();
    let added = new_rows.len();
    new_rows.extend(current_rows);
    (new_rows, Stitch::Concatenated { added })
}
