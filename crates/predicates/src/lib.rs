//! Anchor object model: feature predicates, their ordered conjunction,
//! a fluent builder, and the axis-aligned box the searches operate on.

pub mod anchor;
pub mod bounds;
pub mod builder;
pub mod predicate;

pub use anchor::{Anchor, BoundAnchor};
pub use bounds::{BoundingBox, Interval};
pub use builder::AnchorBuilder;
pub use predicate::{BoundPredicate, ComparisonOperator, Predicate};
