//! Runtime infrastructure - Tokio runtime bridge for the table controllers

mod bridge;
mod session;
mod worker;

pub use bridge::{Backend, RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerSettings};
pub use session::{read_filter, write_filter, PageSnapshot, Session, SourceFactory, TableSession};
pub use worker::run_async_worker;
