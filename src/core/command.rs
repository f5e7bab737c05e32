//! Command parser for the : command system

use ledgerscope::pager::parse_page;

/// Export file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation
    Page(usize),
    Size(usize),
    Live,
    Table(String),

    // Filters
    Account(String),
    Token(String),
    Clear,

    // Output
    Export(ExportFormat),
    Link,

    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let unknown = || Command::Unknown(input.to_string());

    match cmd.to_lowercase().as_str() {
        "page" | "p" => match args.as_deref().map(parse_page) {
            Some(Ok(page)) => Command::Page(page),
            _ => unknown(),
        },
        "size" | "pagesize" => match args.and_then(|s| s.parse().ok()) {
            Some(size) if size > 0 => Command::Size(size),
            _ => unknown(),
        },
        "live" => Command::Live,
        "table" | "t" => args.map(Command::Table).unwrap_or_else(unknown),

        "account" | "acct" => args.map(Command::Account).unwrap_or_else(unknown),
        "token" => args.map(Command::Token).unwrap_or_else(unknown),
        "clear" => Command::Clear,

        "export" => match args.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("csv") => Command::Export(ExportFormat::Csv),
            Some("json") => Command::Export(ExportFormat::Json),
            Some(_) => unknown(),
        },
        "link" => Command::Link,

        "help" | "h" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,

        _ => unknown(),
    }
}
