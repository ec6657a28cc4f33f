//! NodeResourcesAllocatable score plugin for the rk8s scheduler.
//!
//! Nodes are scored by the weighted average of their allocatable resources,
//! then the scores of one round are rescaled into
//! `[MIN_NODE_SCORE, MAX_NODE_SCORE]`.

pub mod config;
pub mod cycle_state;
pub mod error;
pub mod models;
pub mod plugins;
pub mod runtime;
pub mod snapshot;

pub use config::{ModeType, NodeResourcesAllocatableArgs, ResourceSpec, WeightConfiguration};
pub use error::AllocatableError;
pub use plugins::allocatable::{ALLOCATABLE_NAME, Allocatable};
