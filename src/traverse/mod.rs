//! Queries over built hierarchies.
//!
//! All queries go through the [`Hierarchy`] contract, so they run unchanged on eagerly
//! built and lazily sorted trees.
//!
//! [`Hierarchy`]: crate::bounding_hierarchy::Hierarchy

mod nearest;
mod pairwise;
mod volume_query;

pub use self::nearest::*;
pub use self::pairwise::*;
pub use self::volume_query::*;
