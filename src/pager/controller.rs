//! Table controller - configuration, page projection and strategy lifecycle

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::pager::auto_refresh::{AutoRefreshStatus, AutoRefreshStrategy};
use crate::pager::buffer::{LoadOutcome, RowBuffer};
use crate::pager::nav::{NavParams, NavState, NavStore};
use crate::pager::pagination::PaginationStrategy;
use crate::pager::source::TableSource;
use crate::pager::window::Window;

/// Tuning knobs of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    /// Rows per displayed page
    pub page_size: usize,
    /// Largest `limit` sent in a single query; bigger asks are chunked
    pub max_limit: usize,
    /// Granularity of the row-count estimate shown before the list is drained
    pub presumed_row_count: usize,
    /// Auto-refresh cadence
    pub update_period: Duration,
    /// Timer refreshes before auto-refresh pauses itself (0 = never)
    pub max_auto_update_count: u32,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: 15,
            max_limit: 100,
            presumed_row_count: 50,
            update_period: Duration::from_secs(5),
            max_auto_update_count: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerMode {
    Unmounted,
    AutoRefresh,
    Pagination,
}

enum Strategy<S: TableSource> {
    AutoRefresh(AutoRefreshStrategy<S>),
    Pagination(PaginationStrategy<S>),
}

/// Drives one table: owns the row buffer, picks the navigation strategy and
/// exposes the visible page.
///
/// Mounting reads the nav store: a page and an anchor key select pagination,
/// anything else starts the live auto-refresh view. Switching strategies
/// always builds a fresh strategy instance.
pub struct TableController<S: TableSource> {
    config: PagerConfig,
    nav: Arc<dyn NavStore>,
    params: NavParams,
    buffer: Arc<RowBuffer<S>>,
    strategy: Option<Strategy<S>>,
}

impl<S: TableSource> TableController<S> {
    pub fn new(
        source: Arc<S>,
        config: PagerConfig,
        nav: Arc<dyn NavStore>,
        params: NavParams,
    ) -> Self {
        let buffer = Arc::new(RowBuffer::new(source, config.page_size, config.max_limit));
        Self {
            config,
            nav,
            params,
            buffer,
            strategy: None,
        }
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    pub fn buffer(&self) -> &Arc<RowBuffer<S>> {
        &self.buffer
    }

    pub fn source(&self) -> &Arc<S> {
        self.buffer.source()
    }

    pub fn mode(&self) -> PagerMode {
        match self.strategy {
            None => PagerMode::Unmounted,
            Some(Strategy::AutoRefresh(_)) => PagerMode::AutoRefresh,
            Some(Strategy::Pagination(_)) => PagerMode::Pagination,
        }
    }

    pub async fn mount(&mut self) -> Result<LoadOutcome> {
        self.teardown();
        let state = NavState::read(self.nav.as_ref(), &self.params).unwrap_or_else(|err| {
            warn!("ignoring navigation state: {err}");
            NavState::default()
        });

        if state.is_anchored() {
            info!(page = ?state.page, "mounting in pagination mode");
            let pagination = self.new_pagination();
            self.strategy = Some(Strategy::Pagination(pagination.clone()));
            pagination.mount().await
        } else {
            info!("mounting in auto-refresh mode");
            self.start_live().await
        }
    }

    pub fn unmount(&mut self) {
        self.teardown();
        self.buffer.clear();
    }

    /// Switch to the live view: fresh buffer, navigation parameters removed
    pub async fn start_live(&mut self) -> Result<LoadOutcome> {
        self.teardown();
        self.buffer.clear();
        NavState::default().write(self.nav.as_ref(), &self.params);

        let buffer = Arc::clone(&self.buffer);
        let auto = self.strategy.insert(Strategy::AutoRefresh(AutoRefreshStrategy::new(
            buffer,
            self.config.update_period,
            self.config.max_auto_update_count,
        )));
        match auto {
            Strategy::AutoRefresh(auto) => auto.start().await,
            Strategy::Pagination(_) => Ok(LoadOutcome::Discarded),
        }
    }

    /// The pagination strategy, swapping it in if another mode is active.
    ///
    /// Retained rows survive the swap, so leaving the live view for page 2
    /// only fetches the rows page 2 is missing.
    pub fn paginate(&mut self) -> PaginationStrategy<S> {
        if let Some(Strategy::Pagination(pagination)) = &self.strategy {
            return pagination.clone();
        }
        self.teardown();
        self.buffer.abort();
        info!("switching to pagination mode");
        let pagination = self.new_pagination();
        self.strategy = Some(Strategy::Pagination(pagination.clone()));
        pagination
    }

    pub async fn goto_page(&mut self, page: usize) -> Result<LoadOutcome> {
        self.paginate().goto_page(page).await
    }

    pub async fn next_page(&mut self) -> Result<LoadOutcome> {
        let page = self.current_page() + 1;
        self.goto_page(page).await
    }

    pub async fn previous_page(&mut self) -> Result<LoadOutcome> {
        let page = self.current_page().saturating_sub(1).max(1);
        self.goto_page(page).await
    }

    /// Reload the current view: a refresh in live mode, a rebuild from the
    /// recorded anchor in pagination mode
    pub async fn refresh(&mut self) -> Result<LoadOutcome> {
        match &self.strategy {
            Some(Strategy::AutoRefresh(auto)) => auto.refresh_now().await,
            Some(Strategy::Pagination(pagination)) => pagination.clone().reload().await,
            None => Ok(LoadOutcome::Discarded),
        }
    }

    /// Pause or resume the auto-refresh timer; returns the new paused state
    pub fn toggle_pause(&mut self) -> Option<bool> {
        match &mut self.strategy {
            Some(Strategy::AutoRefresh(auto)) => {
                if auto.is_paused() {
                    auto.resume();
                } else {
                    auto.pause();
                }
                Some(auto.is_paused())
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) {
        if let Some(Strategy::AutoRefresh(auto)) = &mut self.strategy {
            auto.resume();
        }
    }

    pub fn auto_refresh_status(&self) -> Option<AutoRefreshStatus> {
        match &self.strategy {
            Some(Strategy::AutoRefresh(auto)) => Some(auto.status()),
            _ => None,
        }
    }

    /// Change the page size, keeping the first visible row on screen
    pub async fn set_page_size(&mut self, page_size: usize) -> Result<LoadOutcome> {
        let page_size = page_size.max(1);
        let first_row = self.buffer.with_window(|window| window.absolute_start());
        self.config.page_size = page_size;
        self.buffer.set_page_size(page_size);

        match &self.strategy {
            Some(Strategy::Pagination(pagination)) => {
                pagination.clone().goto_page(first_row / page_size + 1).await
            }
            Some(Strategy::AutoRefresh(_)) => {
                self.buffer.abort();
                self.buffer.move_to_page(1, None).await
            }
            None => Ok(LoadOutcome::Discarded),
        }
    }

    /// Swap the row source (an upstream filter changed). The buffer and the
    /// active strategy are rebuilt from empty; pagination restarts on page 1.
    pub async fn replace_source(&mut self, source: Arc<S>) -> Result<LoadOutcome> {
        let mode = self.mode();
        self.teardown();
        self.buffer.clear();
        self.buffer = Arc::new(RowBuffer::new(
            source,
            self.config.page_size,
            self.config.max_limit,
        ));

        match mode {
            PagerMode::Pagination => {
                NavState::default().write(self.nav.as_ref(), &self.params);
                self.goto_page(1).await
            }
            PagerMode::AutoRefresh => self.start_live().await,
            PagerMode::Unmounted => Ok(LoadOutcome::Discarded),
        }
    }

    /// Rows of the visible page
    pub fn rows(&self) -> Vec<S::Row> {
        self.buffer.page_rows()
    }

    pub fn window(&self) -> Window<S::Row> {
        self.buffer.window()
    }

    pub fn subscribe(&self) -> watch::Receiver<Window<S::Row>> {
        self.buffer.subscribe()
    }

    /// Exact once drained, otherwise rounded up to `presumed_row_count`
    pub fn total_row_count(&self) -> usize {
        let presumed = self.config.presumed_row_count;
        self.buffer
            .with_window(|window| window.total_row_count(presumed))
    }

    pub fn page_count(&self) -> usize {
        let presumed = self.config.presumed_row_count;
        self.buffer.with_window(|window| window.page_count(presumed))
    }

    pub fn current_page(&self) -> usize {
        self.buffer.with_window(|window| window.current_page())
    }

    pub fn is_drained(&self) -> bool {
        self.buffer.with_window(|window| window.drained)
    }

    pub fn nav_state(&self) -> NavState {
        NavState::read(self.nav.as_ref(), &self.params).unwrap_or_default()
    }

    pub fn key_for(&self, row: &S::Row) -> S::Key {
        self.source().key_for(row)
    }

    pub fn key_to_string(&self, key: &S::Key) -> String {
        self.source().key_to_string(key)
    }

    pub fn key_from_string(&self, value: &str) -> Option<S::Key> {
        self.source().key_from_string(value)
    }

    fn new_pagination(&self) -> PaginationStrategy<S> {
        PaginationStrategy::new(
            Arc::clone(&self.buffer),
            Arc::clone(&self.nav),
            self.params.clone(),
        )
    }

    /// Drop the active strategy, stopping its timer if it has one
    fn teardown(&mut self) {
        if let Some(Strategy::AutoRefresh(mut auto)) = self.strategy.take() {
            auto.stop();
        }
    }
}
