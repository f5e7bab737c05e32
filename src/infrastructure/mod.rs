//! Infrastructure layer - row sources and the async runtime
//!
//! This layer contains:
//! - Mirror node REST sources
//! - In-memory sources and the demo ledger
//! - Tokio runtime bridge driving the table controllers

pub mod demo;
pub mod memory;
pub mod mirror;
pub mod runtime;

pub use memory::MemorySource;
pub use runtime::{Backend, PageSnapshot, RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerSettings};
