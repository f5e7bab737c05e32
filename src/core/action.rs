//! Actions returned by handlers to communicate with the app

use ledgerscope::infrastructure::RuntimeCommand;

/// Actions returned by command and export handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,

    /// Forward a command to the runtime worker
    Runtime(RuntimeCommand),

    /// Copy text to the clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Toggle the help popup
    ToggleHelp,

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
