//! Access-propagation engine
//!
//! Keeps the materialized "who can access which client records, and why"
//! table (`team_members`) consistent with the org chart and with explicit
//! team membership, under four membership/hierarchy actions and two
//! resource-assignment actions. Reads are derived fresh; writes are
//! transactional and preserve one invariant: every manager-derived row is
//! anchored, through its `granted_via` chain, at a current direct member
//! of the same team.

mod context;
pub mod engine;
pub mod error;
pub mod hierarchy;
mod propagate;
pub mod query;

pub use engine::{AccessEngine, EngineConfig, MAX_MANAGER_DEPTH};
pub use error::EngineError;
pub use hierarchy::{ManagerGraph, ManagerLink};
