//! Error types returned while building and querying hierarchies.

use thiserror::Error;

use crate::bounding_hierarchy::NodeId;

/// Errors that can occur while building or querying a hierarchy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// The tree was configured with parameters it cannot be built from.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A query was run against a tree without primitives.
    #[error("query against an empty tree")]
    EmptyTree,

    /// A lazily built node was requested before its parent was materialized.
    #[error("node {node} accessed before its parent was sorted")]
    UnsortedNodeAccessed {
        /// The node that was requested.
        node: NodeId,
    },

    /// A node or item index lies outside of its valid domain.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the indexed domain.
        len: usize,
    },

    /// Structural validation found a broken invariant.
    #[error("corrupt hierarchy at node {node}: {reason}")]
    CorruptHierarchy {
        /// The first node at which validation failed.
        node: NodeId,
        /// The violated invariant.
        reason: &'static str,
    },
}

impl BvhError {
    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        BvhError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BvhError>;
