//! Table sessions - one controller per table plus its navigation store

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{EntityId, TableFilter, TableKind, TabularRow};
use crate::pager::{
    AutoRefreshStatus, Link, LoadOutcome, NavError, NavParams, NavStore, PagerConfig, PagerMode,
    QueryState, TableController, TableSource,
};

/// Builds the row source of a table for a filter
pub type SourceFactory<S> = Box<dyn Fn(&TableFilter) -> Arc<S> + Send + Sync>;

const ACCOUNT_PARAM: &str = "account";
const TOKEN_PARAM: &str = "token";

/// Rendered view of the visible page, as shipped to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub table: TableKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Ordering key of each row, as written to links
    pub keys: Vec<String>,
    pub page: usize,
    pub page_count: usize,
    pub total_row_count: usize,
    pub drained: bool,
    pub page_size: usize,
    pub mode: PagerMode,
    pub live: Option<AutoRefreshStatus>,
    pub filter: TableFilter,
    pub link: String,
}

/// Object-safe face of a table controller, so the worker can hold tables
/// of different row types side by side
#[async_trait]
pub trait TableSession: Send {
    fn kind(&self) -> TableKind;

    fn filter(&self) -> &TableFilter;

    /// Open the table from its navigation state
    async fn mount(&mut self) -> Result<LoadOutcome>;

    fn unmount(&mut self);

    /// Start moving to `page` in the background; a later move supersedes it
    fn goto_page(&mut self, page: usize) -> Result<()>;

    /// Move one page forward or back from the latest requested page.
    /// Returns the target page, or `None` at either end of the list.
    fn step(&mut self, forward: bool) -> Result<Option<usize>>;

    async fn start_live(&mut self) -> Result<LoadOutcome>;

    fn toggle_pause(&mut self) -> Option<bool>;

    async fn refresh(&mut self) -> Result<LoadOutcome>;

    async fn set_page_size(&mut self, page_size: usize) -> Result<LoadOutcome>;

    /// Apply an upstream filter; `None` when this table does not read it
    async fn set_filter(&mut self, filter: &TableFilter) -> Result<Option<LoadOutcome>>;

    /// Outcome of the background move, once it has finished
    async fn settle(&mut self) -> Option<Result<LoadOutcome>>;

    fn link(&self) -> Link;

    fn snapshot(&self) -> PageSnapshot;
}

struct PendingMove {
    page: usize,
    handle: JoinHandle<Result<LoadOutcome>>,
}

pub struct Session<S: TableSource> {
    kind: TableKind,
    filter: TableFilter,
    nav: Arc<QueryState>,
    factory: SourceFactory<S>,
    controller: TableController<S>,
    pending: Option<PendingMove>,
}

impl<S> Session<S>
where
    S: TableSource,
    S::Row: TabularRow,
{
    /// Build a session; the filter is read back from `nav`
    pub fn new(
        kind: TableKind,
        factory: SourceFactory<S>,
        config: PagerConfig,
        nav: Arc<QueryState>,
    ) -> Self {
        let filter = read_filter(nav.as_ref()).scoped(kind);
        let source = factory(&filter);
        let store: Arc<dyn NavStore> = Arc::clone(&nav) as Arc<dyn NavStore>;
        let controller = TableController::new(source, config, store, NavParams::default());
        Self {
            kind,
            filter,
            nav,
            factory,
            controller,
            pending: None,
        }
    }

    pub fn controller(&self) -> &TableController<S> {
        &self.controller
    }

    fn forget_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(page = pending.page, "pending move superseded");
        }
    }
}

#[async_trait]
impl<S> TableSession for Session<S>
where
    S: TableSource,
    S::Row: TabularRow,
{
    fn kind(&self) -> TableKind {
        self.kind
    }

    fn filter(&self) -> &TableFilter {
        &self.filter
    }

    async fn mount(&mut self) -> Result<LoadOutcome> {
        self.forget_pending();
        self.controller.mount().await
    }

    fn unmount(&mut self) {
        self.forget_pending();
        self.controller.unmount();
    }

    fn goto_page(&mut self, page: usize) -> Result<()> {
        if page == 0 {
            return Err(NavError::InvalidPage(page.to_string()).into());
        }
        self.forget_pending();
        let task = self.controller.paginate().begin_goto(page)?;
        let handle = tokio::spawn(task);
        self.pending = Some(PendingMove { page, handle });
        Ok(())
    }

    fn step(&mut self, forward: bool) -> Result<Option<usize>> {
        let base = self
            .pending
            .as_ref()
            .map(|pending| pending.page)
            .unwrap_or_else(|| self.controller.current_page());
        let target = if forward {
            if self.controller.is_drained() && base >= self.controller.page_count() {
                return Ok(None);
            }
            base.saturating_add(1)
        } else {
            if base <= 1 {
                return Ok(None);
            }
            base - 1
        };
        self.goto_page(target)?;
        Ok(Some(target))
    }

    async fn start_live(&mut self) -> Result<LoadOutcome> {
        self.forget_pending();
        self.controller.start_live().await
    }

    fn toggle_pause(&mut self) -> Option<bool> {
        self.controller.toggle_pause()
    }

    async fn refresh(&mut self) -> Result<LoadOutcome> {
        self.forget_pending();
        self.controller.refresh().await
    }

    async fn set_page_size(&mut self, page_size: usize) -> Result<LoadOutcome> {
        self.forget_pending();
        self.controller.set_page_size(page_size).await
    }

    async fn set_filter(&mut self, filter: &TableFilter) -> Result<Option<LoadOutcome>> {
        if !self.filter.affects(filter, self.kind) {
            return Ok(None);
        }
        self.forget_pending();
        self.filter = filter.scoped(self.kind);
        write_filter(self.nav.as_ref(), &self.filter);
        let source = (self.factory)(&self.filter);
        self.controller.replace_source(source).await.map(Some)
    }

    async fn settle(&mut self) -> Option<Result<LoadOutcome>> {
        if !self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.handle.is_finished())
        {
            return None;
        }
        let pending = self.pending.take()?;
        Some(match pending.handle.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("page move to {} failed: {err}", pending.page)),
        })
    }

    fn link(&self) -> Link {
        Link::new(self.kind.name(), self.nav.as_ref().clone())
    }

    fn snapshot(&self) -> PageSnapshot {
        let controller = &self.controller;
        let source = controller.source();
        let (rows, keys): (Vec<Vec<String>>, Vec<String>) =
            controller.buffer().with_window(|window| {
                window
                    .page_rows()
                    .iter()
                    .map(|row| (row.cells(), source.key_to_string(&source.key_for(row))))
                    .unzip()
            });
        PageSnapshot {
            table: self.kind,
            columns: S::Row::columns().iter().map(|c| c.to_string()).collect(),
            rows,
            keys,
            page: controller.current_page(),
            page_count: controller.page_count(),
            total_row_count: controller.total_row_count(),
            drained: controller.is_drained(),
            page_size: controller.config().page_size,
            mode: controller.mode(),
            live: controller.auto_refresh_status(),
            filter: self.filter.clone(),
            link: self.link().to_string(),
        }
    }
}

/// Filter recorded in a navigation store
pub fn read_filter(nav: &dyn NavStore) -> TableFilter {
    let parse = |name: &str| {
        nav.get(name).and_then(|raw| match raw.parse::<EntityId>() {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(param = name, "ignoring filter: {err}");
                None
            }
        })
    };
    TableFilter {
        account: parse(ACCOUNT_PARAM),
        token: parse(TOKEN_PARAM),
    }
}

pub fn write_filter(nav: &dyn NavStore, filter: &TableFilter) {
    nav.set(ACCOUNT_PARAM, filter.account.map(|id| id.to_string()));
    nav.set(TOKEN_PARAM, filter.token.map(|id| id.to_string()));
}
