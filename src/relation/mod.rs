//! Relationship stores.
//!
//! Two ways to relate records:
//!
//! - [`NestedStore`]: sub-records embedded in their parent document and
//!   matched one object at a time;
//! - [`ParentChildStore`]: separate documents joined through the parent
//!   identifier each child carries.
//!
//! Both are thin views over a [`Collection`](crate::index::Collection): they
//! write through it and search its committed snapshot.

pub mod nested;
pub mod parent_child;

pub use nested::NestedStore;
pub use parent_child::ParentChildStore;
