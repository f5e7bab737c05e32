//! Export Module
//!
//! Writes the visible page to disk.
//!
//! - 'e' key and `:export` write CSV
//! - `:export json` writes JSON with the page position and link
//! - Files saved to `<data_dir>/exports/`

mod csv_export;
mod json_export;

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use ledgerscope::config;
use ledgerscope::infrastructure::PageSnapshot;

use crate::core::{Action, ExportFormat, NotifyLevel};

/// Get the export directory path, creating it if needed
fn get_export_dir() -> std::io::Result<PathBuf> {
    let export_dir = config::export_dir().unwrap_or_else(|| PathBuf::from(".ledgerscope").join("exports"));
    fs::create_dir_all(&export_dir)?;
    Ok(export_dir)
}

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Export the visible page
pub fn export_page(page: &PageSnapshot, format: ExportFormat) -> Action {
    if page.rows.is_empty() {
        return Action::Notify("No rows to export".to_string(), NotifyLevel::Warn);
    }

    let export_dir = match get_export_dir() {
        Ok(dir) => dir,
        Err(e) => {
            return Action::Notify(
                format!("Failed to create export directory: {}", e),
                NotifyLevel::Error,
            )
        }
    };

    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    let filename = generate_filename(page.table.name(), extension);
    let path = export_dir.join(&filename);

    let written = match format {
        ExportFormat::Csv => csv_export::write_page(&path, page),
        ExportFormat::Json => json_export::write_page(&path, page),
    };
    match written {
        Ok(count) => Action::Notify(
            format!("Exported {} rows to {}", count, path.display()),
            NotifyLevel::Info,
        ),
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ledgerscope::domain::{TableFilter, TableKind};
    use ledgerscope::infrastructure::PageSnapshot;
    use ledgerscope::pager::PagerMode;

    pub fn page() -> PageSnapshot {
        PageSnapshot {
            table: TableKind::Tokens,
            columns: vec!["token".to_string(), "symbol".to_string()],
            rows: vec![
                vec!["0.0.7".to_string(), "SEVEN".to_string()],
                vec!["0.0.6".to_string(), "SIX, INC".to_string()],
            ],
            keys: vec!["0.0.7".to_string(), "0.0.6".to_string()],
            page: 2,
            page_count: 5,
            total_row_count: 50,
            drained: false,
            page_size: 2,
            mode: PagerMode::Pagination,
            live: None,
            filter: TableFilter::default(),
            link: "ledgerscope://tokens?k=0.0.7&p=2".to_string(),
        }
    }
}
