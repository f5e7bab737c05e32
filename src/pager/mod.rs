//! Windowed pagination engine
//!
//! Presents an unbounded, newest-first list over a source that only supports
//! `gt`/`gte`/`lt`/`lte` filters on an ordering key plus a `limit`:
//!
//! - [`RowBuffer`] keeps a contiguous window of rows and fetches what a page
//!   move is missing
//! - [`TableController`] exposes the visible page and owns the strategy
//! - [`PaginationStrategy`] navigates explicit pages recorded in a [`NavStore`]
//! - [`AutoRefreshStrategy`] keeps the newest page live

mod auto_refresh;
mod buffer;
mod controller;
mod guard;
pub mod nav;
mod pagination;
mod source;
mod window;

pub use auto_refresh::{AutoRefreshStatus, AutoRefreshStrategy};
pub use buffer::{LoadOutcome, PreparedMove, RowBuffer};
pub use controller::{PagerConfig, PagerMode, TableController};
pub use guard::{AbortGuard, Ticket};
pub use nav::{parse_page, Link, NavError, NavParams, NavState, NavStore, QueryState, MAX_PAGE};
pub use pagination::PaginationStrategy;
pub use source::{Operator, SortOrder, TableSource};
pub use window::{concat_or_replace, Stitch, Window};
