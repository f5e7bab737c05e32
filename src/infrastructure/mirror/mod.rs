//! Mirror node REST integration

mod client;
mod sources;

pub use client::{ListQuery, MirrorClient};
pub use sources::MirrorSource;
