//! Runtime bridge - connects the sync TUI thread with the async Tokio runtime
//!
//! The TUI sends [`RuntimeCommand`]s and polls [`RuntimeEvent`]s; every
//! controller and row buffer lives on the worker thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;

use crate::domain::{TableFilter, TableKind};
use crate::infrastructure::runtime::session::PageSnapshot;
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::pager::{Link, PagerConfig};

/// Where rows come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Mirror node REST API
    Mirror { base_url: String, timeout: Duration },
    /// Synthetic in-memory ledger that keeps growing
    Demo,
}

/// Startup parameters of the worker
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub backend: Backend,
    pub pager: PagerConfig,
    /// Table shown first
    pub table: TableKind,
    /// Link to reopen; overrides `table`
    pub link: Option<Link>,
}

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Show another table; it resumes where it was left
    SwitchTable { table: TableKind },
    /// Open an explicit page of the current table
    GotoPage { page: usize },
    NextPage,
    PrevPage,
    /// Back to the live, auto-refreshing view
    Live,
    /// Pause or resume auto-refresh
    TogglePause,
    /// Force refresh of the current view
    Refresh,
    SetPageSize { page_size: usize },
    /// Change the upstream filter of every table
    SetFilter { filter: TableFilter },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// The visible page changed
    Page(PageSnapshot),
    /// Informational message
    Notice { message: String },
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new(settings: WorkerSettings) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();
        let runtime = Runtime::new()?;

        thread::Builder::new()
            .name("ledgerscope-worker".to_string())
            .spawn(move || {
                runtime.block_on(async {
                    if let Err(err) = run_async_worker(settings, cmd_rx, evt_tx.clone()).await {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
