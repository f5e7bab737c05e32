//! Pagination strategy - explicit page numbers synchronized with a nav store

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::pager::buffer::{LoadOutcome, RowBuffer};
use crate::pager::nav::{NavError, NavParams, NavState, NavStore};
use crate::pager::source::TableSource;

/// Moves the window to explicit page numbers and records `{page, key}` after
/// every committed move, so that reopening the same parameters reproduces
/// the page. Cheap to clone: clones drive the same buffer.
pub struct PaginationStrategy<S: TableSource> {
    buffer: Arc<RowBuffer<S>>,
    nav: Arc<dyn NavStore>,
    params: NavParams,
}

impl<S: TableSource> Clone for PaginationStrategy<S> {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            nav: Arc::clone(&self.nav),
            params: self.params.clone(),
        }
    }
}

impl<S: TableSource> PaginationStrategy<S> {
    pub fn new(buffer: Arc<RowBuffer<S>>, nav: Arc<dyn NavStore>, params: NavParams) -> Self {
        Self {
            buffer,
            nav,
            params,
        }
    }

    /// Open the page recorded in the nav store, anchored at its key if the
    /// key decodes
    pub async fn mount(&self) -> Result<LoadOutcome> {
        let state = match NavState::read(self.nav.as_ref(), &self.params) {
            Ok(state) => state,
            Err(err) => {
                warn!("ignoring navigation state: {err}");
                NavState::default()
            }
        };
        let page = state.page.unwrap_or(1);
        let source = self.buffer.source();
        let key = state
            .key
            .as_deref()
            .and_then(|raw| source.key_from_string(raw));
        if state.key.is_some() && key.is_none() {
            warn!(key = ?state.key, "anchor key does not decode, opening page without it");
        }

        self.buffer.abort();
        let prepared = self.buffer.prepare_move(page)?;
        let outcome = self.buffer.run_move(prepared, key.as_ref()).await?;
        self.record(outcome);
        Ok(outcome)
    }

    pub async fn goto_page(&self, page: usize) -> Result<LoadOutcome> {
        self.begin_goto(page)?.await
    }

    /// Supersede every in-flight operation and return the move to `page`.
    ///
    /// The move is ordered against other requests here, not when the
    /// returned future is first polled, so futures may be spawned and run in
    /// any order: only the most recently begun move can commit.
    pub fn begin_goto(
        &self,
        page: usize,
    ) -> Result<impl Future<Output = Result<LoadOutcome>> + Send + 'static> {
        if page == 0 {
            return Err(NavError::InvalidPage(page.to_string()).into());
        }
        self.buffer.abort();
        let prepared = self.buffer.prepare_move(page)?;
        let strategy = self.clone();
        Ok(async move {
            let outcome = strategy.buffer.run_move(prepared, None).await?;
            strategy.record(outcome);
            Ok(outcome)
        })
    }

    /// Drop the retained rows and rebuild the current page from its anchor
    pub async fn reload(&self) -> Result<LoadOutcome> {
        self.buffer.clear();
        self.mount().await
    }

    pub fn current_page(&self) -> usize {
        self.buffer.with_window(|window| window.current_page())
    }

    fn record(&self, outcome: LoadOutcome) {
        if !outcome.is_committed() {
            return;
        }
        let source = self.buffer.source();
        let state = self.buffer.with_window(|window| NavState {
            page: Some(window.current_page()),
            key: window
                .first_visible()
                .map(|row| source.key_to_string(&source.key_for(row))),
        });
        debug!(page = ?state.page, key = ?state.key, "navigation recorded");
        state.write(self.nav.as_ref(), &self.params);
    }
}
