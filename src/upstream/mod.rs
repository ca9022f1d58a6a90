//! Upstream backends and least-loaded selection among a host's
//! replicas (spec.md §4.5).

mod group;
mod replica;

pub use group::{SelectionStrategy, UpstreamGroup};
pub use replica::Replica;
