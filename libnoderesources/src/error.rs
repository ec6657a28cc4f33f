use thiserror::Error;

use crate::models::ResourceName;

#[derive(Debug, Error)]
pub enum AllocatableError {
    #[error("resource weight of {resource} should be a positive value, got {weight}")]
    Configuration { resource: ResourceName, weight: i64 },

    #[error("mode {0:?} is not supported, expected \"Least\" or \"Most\"")]
    UnsupportedMode(String),

    #[error("at least one weighted resource is required to score nodes")]
    DegenerateConfiguration,

    #[error("node {0:?} not found")]
    NodeNotFound(String),

    #[error("invalid NodeResourcesAllocatable args: {0}")]
    InvalidArgs(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, AllocatableError>;
