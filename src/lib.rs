//! ledgerscope - windowed browsing of mirror node lists
//!
//! The [`pager`] module is the engine; [`infrastructure`] supplies row
//! sources and the runtime the terminal UI talks to.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod pager;
