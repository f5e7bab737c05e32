//! JSON Export
//!
//! Writes the page with its position so the file can be traced back to a link.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ledgerscope::infrastructure::PageSnapshot;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
struct ExportablePage<'a> {
    table: &'a str,
    page: usize,
    page_size: usize,
    link: &'a str,
    rows: Vec<Map<String, Value>>,
}

impl<'a> From<&'a PageSnapshot> for ExportablePage<'a> {
    fn from(page: &'a PageSnapshot) -> Self {
        let rows = page
            .rows
            .iter()
            .map(|row| {
                page.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.clone(), Value::String(cell.clone())))
                    .collect()
            })
            .collect();
        Self {
            table: page.table.name(),
            page: page.page,
            page_size: page.page_size,
            link: &page.link,
            rows,
        }
    }
}

/// Write the page to a JSON file
pub fn write_page(path: &Path, page: &PageSnapshot) -> Result<usize, Box<dyn std::error::Error>> {
    let exportable = ExportablePage::from(page);

    let json = serde_json::to_string_pretty(&exportable)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(page.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::export::test_support;

    #[test]
    fn test_write_page_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        assert_eq!(write_page(&path, &test_support::page()).unwrap(), 2);

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["table"], "tokens");
        assert_eq!(value["page"], 2);
        assert_eq!(value["link"], "ledgerscope://tokens?k=0.0.7&p=2");
        assert_eq!(value["rows"][1]["symbol"], "SIX, INC");
    }
}
