//! The factor graph container: an [Order] over the current [Values](crate::variables::Values),
//! and a [Graph] of [Factor](crate::factors::Factor)s linearized against it.

mod order;
pub use order::{Idx, Order};

mod graph;
pub use graph::Graph;
