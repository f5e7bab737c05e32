//! CSV Export

use std::path::Path;

use ledgerscope::infrastructure::PageSnapshot;

/// Write the page rows under their column headers
pub fn write_page(path: &Path, page: &PageSnapshot) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(&page.columns)?;
    for row in &page.rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(page.rows.len())
}
