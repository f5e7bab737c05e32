mod app;
mod core;
mod modules;
mod ui;

use std::fs::{self, File};
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ledgerscope::config::{self, Config};
use ledgerscope::domain::TableKind;
use ledgerscope::infrastructure::{Backend, RuntimeBridge, RuntimeCommand, WorkerSettings};
use ledgerscope::pager::Link;

use crate::app::{App, InputMode};
use crate::core::{Action, ExportFormat, NotifyLevel};

#[derive(Debug, Parser)]
#[command(
    name = "ledgerscope",
    version,
    about = "Ledgerscope: page through mirror node lists from the terminal"
)]
struct Args {
    /// Mirror node base url (e.g. https://testnet.mirrornode.hedera.com)
    #[arg(long)]
    mirror: Option<String>,

    /// Browse a synthetic, growing ledger instead of a mirror node
    #[arg(long, conflicts_with = "mirror")]
    demo: bool,

    /// Table shown first: transactions, accounts, tokens or holders
    #[arg(long, default_value = "transactions")]
    table: TableKind,

    /// Reopen a copied ledgerscope:// link
    #[arg(long)]
    link: Option<String>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Log filter, e.g. `debug` or `ledgerscope=trace`
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = effective_config(&args)?;
    init_tracing(&config)?;

    let link = args
        .link
        .as_deref()
        .map(Link::parse)
        .transpose()
        .context("Invalid --link")?;
    let table = link
        .as_ref()
        .and_then(|link| link.table.parse().ok())
        .unwrap_or(args.table);
    let (backend, source_label) = if args.demo {
        (Backend::Demo, "demo".to_string())
    } else {
        (
            Backend::Mirror {
                base_url: config.mirror_url.clone(),
                timeout: config.request_timeout(),
            },
            config.mirror_url.clone(),
        )
    };
    let settings = WorkerSettings {
        backend,
        pager: config.to_pager_config(),
        table,
        link,
    };
    info!(?settings, "starting");

    let runtime = RuntimeBridge::new(settings)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(table, source_label);
    app.set_status("Loading…", NotifyLevel::Info);

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Config file values with command line overrides applied
fn effective_config(args: &Args) -> Result<Config> {
    let mut config = config::load().context("Failed to load config")?;
    if let Some(mirror) = &args.mirror {
        config.mirror_url = mirror.clone();
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.validate().context("Invalid settings")?;
    Ok(config)
}

/// Log to `<data_dir>/ledgerscope.log`; the terminal belongs to the TUI
fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = config::log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime)?;
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

/// Forward queued commands and apply worker events
fn pump_background(app: &mut App, runtime: &RuntimeBridge) -> Result<()> {
    for cmd in app.take_outbox() {
        runtime.send(cmd)?;
    }
    for event in runtime.poll_events() {
        app.apply_event(event);
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char(':') => {
            app.enter_command();
            Action::None
        }
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
            Action::Runtime(RuntimeCommand::NextPage)
        }
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
            Action::Runtime(RuntimeCommand::PrevPage)
        }
        KeyCode::Char('l') => Action::Runtime(RuntimeCommand::Live),
        KeyCode::Char(' ') => Action::Runtime(RuntimeCommand::TogglePause),
        KeyCode::Char('r') => Action::Runtime(RuntimeCommand::Refresh),
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            Action::None
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.resize_page(5);
            Action::None
        }
        KeyCode::Char('-') => {
            app.resize_page(-5);
            Action::None
        }
        KeyCode::Tab => {
            app.next_table();
            Action::None
        }
        KeyCode::Char('y') => match app.link() {
            Some(link) => Action::Copy(link),
            None => Action::Notify("Nothing to copy".to_string(), NotifyLevel::Warn),
        },
        KeyCode::Char('Y') => match app.selected_key() {
            Some(key) => Action::Copy(key),
            None => Action::Notify("Nothing to copy".to_string(), NotifyLevel::Warn),
        },
        KeyCode::Char('e') => match app.page.as_ref() {
            Some(page) => modules::export::export_page(page, ExportFormat::Csv),
            None => Action::Notify("Nothing to export yet".to_string(), NotifyLevel::Warn),
        },
        _ => Action::None,
    };
    dispatch(app, action);
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_command(),
        KeyCode::Enter => {
            let action = app.submit_command();
            dispatch(app, action);
        }
        KeyCode::Backspace => {
            if app.command_input.pop().is_none() {
                app.cancel_command();
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
}

fn dispatch(app: &mut App, action: Action) {
    match action {
        Action::Copy(text) => copy_to_clipboard(app, text),
        other => app.apply_action(other),
    }
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied: {text}"), NotifyLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", NotifyLevel::Error);
            }
        }
        Err(_) => {
            app.set_status(format!("Clipboard not available: {text}"), NotifyLevel::Warn);
        }
    }
}
