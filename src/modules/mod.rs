//! UI Modules
//!
//! - export: CSV and JSON export of the visible page

pub mod export;
