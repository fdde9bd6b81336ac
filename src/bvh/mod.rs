//! The two hierarchies of this crate and the functors they are built from.
//!
//! [`KeyTree`] sorts primitives along a scalar key and splits ranges where the key
//! prefix changes. [`AxisTree`] splits ranges at the median along the most spread
//! axis and can postpone that work until a node is first visited.

mod axis_tree;
mod functors;
mod key_tree;
mod node;

pub use self::axis_tree::*;
pub use self::functors::*;
pub use self::key_tree::*;
pub use self::node::*;
