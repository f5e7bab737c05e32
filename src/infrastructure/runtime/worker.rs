//! Async worker - runs in the Tokio runtime and drives the table controllers

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{TableFilter, TableKind};
use crate::infrastructure::demo::DemoLedger;
use crate::infrastructure::mirror::{MirrorClient, MirrorSource};
use crate::infrastructure::runtime::bridge::{Backend, RuntimeCommand, RuntimeEvent, WorkerSettings};
use crate::infrastructure::runtime::session::{
    read_filter, write_filter, PageSnapshot, Session, TableSession,
};
use crate::pager::{LoadOutcome, PagerConfig, QueryState};

const DEMO_TRANSACTIONS: u64 = 1_200;
const DEMO_GROWTH_PERIOD: Duration = Duration::from_secs(2);

/// Run the async worker loop
pub async fn run_async_worker(
    settings: WorkerSettings,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let sources = Sources::connect(&settings.backend)?;
    let mut tables = Tables::new(sources, settings.pager.clone());

    let (active, query) = match settings.link {
        Some(link) => match link.table.parse::<TableKind>() {
            Ok(table) => (table, link.query),
            Err(err) => {
                send_error(&evt_tx, format!("Ignoring link: {err}"));
                (settings.table, QueryState::new())
            }
        },
        None => (settings.table, QueryState::new()),
    };
    tables.open_with(active, query);
    report(&evt_tx, tables.active_mut().mount().await);

    let mut last_sent: Option<PageSnapshot> = None;
    let mut ticker = interval(Duration::from_millis(50));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // Process commands (non-blocking)
        loop {
            let cmd = match cmd_rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tables.shutdown();
                    return Ok(());
                }
            };
            debug!(?cmd, "runtime command");
            match cmd {
                RuntimeCommand::Shutdown => {
                    tables.shutdown();
                    return Ok(());
                }

                RuntimeCommand::SwitchTable { table } => {
                    if table != tables.active {
                        tables.active_mut().unmount();
                        tables.open(table);
                        report(&evt_tx, tables.active_mut().mount().await);
                    }
                }

                RuntimeCommand::GotoPage { page } => {
                    if let Err(err) = tables.active_mut().goto_page(page) {
                        send_error(&evt_tx, format!("{err:#}"));
                    }
                }

                RuntimeCommand::NextPage => step(&mut tables, &evt_tx, true),

                RuntimeCommand::PrevPage => step(&mut tables, &evt_tx, false),

                RuntimeCommand::Live => {
                    report(&evt_tx, tables.active_mut().start_live().await);
                }

                RuntimeCommand::TogglePause => match tables.active_mut().toggle_pause() {
                    Some(true) => send_notice(&evt_tx, "Auto refresh paused"),
                    Some(false) => send_notice(&evt_tx, "Auto refresh resumed"),
                    None => send_notice(&evt_tx, "Auto refresh runs in the live view only"),
                },

                RuntimeCommand::Refresh => {
                    report(&evt_tx, tables.active_mut().refresh().await);
                }

                RuntimeCommand::SetPageSize { page_size } => {
                    tables.config.page_size = page_size.max(1);
                    report(&evt_tx, tables.active_mut().set_page_size(page_size).await);
                }

                RuntimeCommand::SetFilter { filter } => {
                    for result in tables.set_filter(filter).await {
                        report(&evt_tx, result);
                    }
                }
            }
        }

        if let Some(result) = tables.active_mut().settle().await {
            report(&evt_tx, result);
        }

        let snapshot = tables.active_mut().snapshot();
        if last_sent.as_ref() != Some(&snapshot) {
            let _ = evt_tx.send(RuntimeEvent::Page(snapshot.clone()));
            last_sent = Some(snapshot);
        }

        ticker.tick().await;
    }
}

/// Row sources of the selected backend
enum Sources {
    Mirror(MirrorClient),
    Demo {
        ledger: Arc<DemoLedger>,
        growth: JoinHandle<()>,
    },
}

impl Sources {
    fn connect(backend: &Backend) -> Result<Self> {
        match backend {
            Backend::Mirror { base_url, timeout } => {
                info!(%base_url, "using mirror node");
                Ok(Self::Mirror(MirrorClient::new(base_url.clone(), *timeout)?))
            }
            Backend::Demo => {
                info!("using demo ledger");
                let ledger = Arc::new(DemoLedger::new(DEMO_TRANSACTIONS));
                let growth = ledger.spawn_growth(DEMO_GROWTH_PERIOD);
                Ok(Self::Demo { ledger, growth })
            }
        }
    }

    fn session(
        &self,
        kind: TableKind,
        config: PagerConfig,
        nav: Arc<QueryState>,
    ) -> Box<dyn TableSession> {
        match self {
            Self::Mirror(client) => {
                let client = client.clone();
                match kind {
                    TableKind::Transactions => Box::new(Session::new(
                        kind,
                        Box::new(move |filter: &TableFilter| {
                            Arc::new(MirrorSource::transactions(client.clone(), filter))
                        }),
                        config,
                        nav,
                    )),
                    TableKind::Accounts => Box::new(Session::new(
                        kind,
                        Box::new(move |_: &TableFilter| {
                            Arc::new(MirrorSource::accounts(client.clone()))
                        }),
                        config,
                        nav,
                    )),
                    TableKind::Tokens => Box::new(Session::new(
                        kind,
                        Box::new(move |_: &TableFilter| Arc::new(MirrorSource::tokens(client.clone()))),
                        config,
                        nav,
                    )),
                    TableKind::Holders => Box::new(Session::new(
                        kind,
                        Box::new(move |filter: &TableFilter| {
                            Arc::new(MirrorSource::holders(client.clone(), filter))
                        }),
                        config,
                        nav,
                    )),
                }
            }
            Self::Demo { ledger, .. } => {
                let ledger = Arc::clone(ledger);
                match kind {
                    TableKind::Transactions => Box::new(Session::new(
                        kind,
                        Box::new(move |filter: &TableFilter| match filter.account {
                            Some(account) => ledger.account_transactions(account),
                            None => Arc::clone(&ledger.transactions),
                        }),
                        config,
                        nav,
                    )),
                    TableKind::Accounts => Box::new(Session::new(
                        kind,
                        Box::new(move |_: &TableFilter| Arc::clone(&ledger.accounts)),
                        config,
                        nav,
                    )),
                    TableKind::Tokens => Box::new(Session::new(
                        kind,
                        Box::new(move |_: &TableFilter| Arc::clone(&ledger.tokens)),
                        config,
                        nav,
                    )),
                    TableKind::Holders => Box::new(Session::new(
                        kind,
                        Box::new(move |filter: &TableFilter| ledger.holders(filter.token)),
                        config,
                        nav,
                    )),
                }
            }
        }
    }
}

/// Every table opened so far; only the active one is mounted
struct Tables {
    sources: Sources,
    config: PagerConfig,
    filter: TableFilter,
    sessions: HashMap<TableKind, Box<dyn TableSession>>,
    active: TableKind,
}

impl Tables {
    fn new(sources: Sources, config: PagerConfig) -> Self {
        Self {
            sources,
            config,
            filter: TableFilter::default(),
            sessions: HashMap::new(),
            active: TableKind::Transactions,
        }
    }

    /// Open `kind` from a recorded query, adopting the filter it carries
    fn open_with(&mut self, kind: TableKind, query: QueryState) {
        let recorded = read_filter(&query);
        self.filter.account = recorded.account.or(self.filter.account);
        self.filter.token = recorded.token.or(self.filter.token);
        let session = self
            .sources
            .session(kind, self.config.clone(), Arc::new(query));
        self.sessions.insert(kind, session);
        self.active = kind;
    }

    /// Make `kind` active; its session is created on first use
    fn open(&mut self, kind: TableKind) {
        self.active = kind;
    }

    fn active_mut(&mut self) -> &mut Box<dyn TableSession> {
        let kind = self.active;
        let Self {
            sources,
            config,
            filter,
            sessions,
            ..
        } = self;
        sessions.entry(kind).or_insert_with(|| {
            let query = QueryState::new();
            write_filter(&query, &filter.scoped(kind));
            sources.session(kind, config.clone(), Arc::new(query))
        })
    }

    /// Apply a filter everywhere; inactive tables only swap their source
    async fn set_filter(&mut self, filter: TableFilter) -> Vec<Result<LoadOutcome>> {
        self.filter = filter;
        let mut results = Vec::new();
        for session in self.sessions.values_mut() {
            match session.set_filter(&self.filter).await {
                Ok(Some(outcome)) => results.push(Ok(outcome)),
                Ok(None) => {}
                Err(err) => results.push(Err(err)),
            }
        }
        results
    }

    fn shutdown(&mut self) {
        for session in self.sessions.values_mut() {
            session.unmount();
        }
        if let Sources::Demo { growth, .. } = &self.sources {
            growth.abort();
        }
        info!("worker shut down");
    }
}

fn step(tables: &mut Tables, evt_tx: &Sender<RuntimeEvent>, forward: bool) {
    match tables.active_mut().step(forward) {
        Ok(Some(page)) => debug!(page, "moving"),
        Ok(None) if forward => send_notice(evt_tx, "Already on the last page"),
        Ok(None) => send_notice(evt_tx, "Already on the first page"),
        Err(err) => send_error(evt_tx, format!("{err:#}")),
    }
}

fn report(evt_tx: &Sender<RuntimeEvent>, result: Result<LoadOutcome>) {
    match result {
        Ok(LoadOutcome::Committed) => {}
        Ok(LoadOutcome::Discarded) => debug!("load superseded"),
        Err(err) => {
            warn!("load failed: {err:#}");
            send_error(evt_tx, format!("Load failed: {err:#}"));
        }
    }
}

fn send_notice(evt_tx: &Sender<RuntimeEvent>, message: impl Into<String>) {
    let _ = evt_tx.send(RuntimeEvent::Notice {
        message: message.into(),
    });
}

fn send_error(evt_tx: &Sender<RuntimeEvent>, message: String) {
    let _ = evt_tx.send(RuntimeEvent::Error { message });
}
