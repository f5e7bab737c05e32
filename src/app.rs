use std::time::{Duration, Instant};

use ledgerscope::domain::{EntityId, TableFilter, TableKind};
use ledgerscope::infrastructure::{PageSnapshot, RuntimeCommand, RuntimeEvent};
use ledgerscope::pager::PagerMode;

use crate::core::{parse_command, Action, Command, NotifyLevel};
use crate::modules::export;

const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: NotifyLevel,
    pub since: Instant,
}

pub struct App {
    pub table: TableKind,
    /// Latest page of `table` sent by the worker
    pub page: Option<PageSnapshot>,
    pub filter: TableFilter,
    /// Mirror url or "demo"
    pub source_label: String,
    pub selected_row: usize,
    pub input_mode: InputMode,
    pub command_input: String,
    pub help_open: bool,
    pub should_quit: bool,
    status: Option<StatusMessage>,
    outbox: Vec<RuntimeCommand>,
}

impl App {
    pub fn new(table: TableKind, source_label: impl Into<String>) -> Self {
        Self {
            table,
            page: None,
            filter: TableFilter::default(),
            source_label: source_label.into(),
            selected_row: 0,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            help_open: false,
            should_quit: false,
            status: None,
            outbox: Vec::new(),
        }
    }

    /// Queue a command for the worker
    pub fn request(&mut self, cmd: RuntimeCommand) {
        self.outbox.push(cmd);
    }

    pub fn take_outbox(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn apply_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Page(page) => {
                if page.table != self.table {
                    return;
                }
                self.filter = merge_filter(&self.filter, &page.filter, page.table);
                self.selected_row = self.selected_row.min(page.rows.len().saturating_sub(1));
                self.page = Some(page);
            }
            RuntimeEvent::Notice { message } => self.set_status(message, NotifyLevel::Info),
            RuntimeEvent::Error { message } => self.set_status(message, NotifyLevel::Error),
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: NotifyLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, NotifyLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    pub fn mode(&self) -> PagerMode {
        self.page
            .as_ref()
            .map(|page| page.mode)
            .unwrap_or(PagerMode::Unmounted)
    }

    pub fn switch_table(&mut self, table: TableKind) {
        if table == self.table {
            return;
        }
        self.table = table;
        self.page = None;
        self.selected_row = 0;
        self.request(RuntimeCommand::SwitchTable { table });
    }

    pub fn next_table(&mut self) {
        self.switch_table(self.table.next());
    }

    /// Grow or shrink the page by `delta` rows
    pub fn resize_page(&mut self, delta: isize) {
        let Some(current) = self.page.as_ref().map(|page| page.page_size) else {
            return;
        };
        let page_size = current.saturating_add_signed(delta).max(1);
        if page_size != current {
            self.request(RuntimeCommand::SetPageSize { page_size });
        }
    }

    pub fn select_next(&mut self) {
        let rows = self.page.as_ref().map(|page| page.rows.len()).unwrap_or(0);
        if self.selected_row + 1 < rows {
            self.selected_row += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn link(&self) -> Option<String> {
        self.page.as_ref().map(|page| page.link.clone())
    }

    pub fn selected_key(&self) -> Option<String> {
        self.page
            .as_ref()
            .and_then(|page| page.keys.get(self.selected_row).cloned())
    }

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command_input.clear();
    }

    pub fn cancel_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command_input.clear();
    }

    /// Run the typed command line
    pub fn submit_command(&mut self) -> Action {
        let input = std::mem::take(&mut self.command_input);
        self.input_mode = InputMode::Normal;
        if input.trim().is_empty() {
            return Action::None;
        }
        self.execute_command(&input)
    }

    pub fn execute_command(&mut self, input: &str) -> Action {
        match parse_command(input) {
            Command::Page(page) => Action::Runtime(RuntimeCommand::GotoPage { page }),
            Command::Size(page_size) => Action::Runtime(RuntimeCommand::SetPageSize { page_size }),
            Command::Live => Action::Runtime(RuntimeCommand::Live),
            Command::Table(name) => match name.parse::<TableKind>() {
                Ok(table) => {
                    self.switch_table(table);
                    Action::None
                }
                Err(err) => Action::Notify(err, NotifyLevel::Warn),
            },
            Command::Account(raw) => match raw.parse::<EntityId>() {
                Ok(account) => self.apply_filter(TableFilter {
                    account: Some(account),
                    ..self.filter.clone()
                }),
                Err(err) => Action::Notify(err.to_string(), NotifyLevel::Warn),
            },
            Command::Token(raw) => match raw.parse::<EntityId>() {
                Ok(token) => self.apply_filter(TableFilter {
                    token: Some(token),
                    ..self.filter.clone()
                }),
                Err(err) => Action::Notify(err.to_string(), NotifyLevel::Warn),
            },
            Command::Clear => self.apply_filter(TableFilter::default()),
            Command::Export(format) => match self.page.as_ref() {
                Some(page) => export::export_page(page, format),
                None => Action::Notify("Nothing to export yet".to_string(), NotifyLevel::Warn),
            },
            Command::Link => match self.link() {
                Some(link) => Action::Copy(link),
                None => Action::Notify("No link yet".to_string(), NotifyLevel::Warn),
            },
            Command::Help => Action::ToggleHelp,
            Command::Quit => Action::Quit,
            Command::Unknown(input) => Action::Notify(
                format!("Unknown command: {input}"),
                NotifyLevel::Warn,
            ),
        }
    }

    /// Everything except clipboard copies, which need the terminal side
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None | Action::Copy(_) => {}
            Action::Runtime(cmd) => self.request(cmd),
            Action::Notify(text, level) => self.set_status(text, level),
            Action::ToggleHelp => self.help_open = !self.help_open,
            Action::Quit => self.should_quit = true,
        }
    }

    fn apply_filter(&mut self, filter: TableFilter) -> Action {
        if filter == self.filter {
            return Action::None;
        }
        self.filter = filter.clone();
        Action::Runtime(RuntimeCommand::SetFilter { filter })
    }
}

/// `current` with the fields `table` reads replaced by what the worker reported
fn merge_filter(current: &TableFilter, reported: &TableFilter, table: TableKind) -> TableFilter {
    match table {
        TableKind::Transactions => TableFilter {
            account: reported.account,
            ..current.clone()
        },
        TableKind::Holders => TableFilter {
            token: reported.token,
            ..current.clone()
        },
        TableKind::Accounts | TableKind::Tokens => current.clone(),
    }
}
