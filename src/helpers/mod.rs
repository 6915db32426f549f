//! Content helpers built on accessors: lists, conditionals and
//! comparisons for composing conditions.

pub mod repeat;
pub mod when;
pub mod compare;

pub use repeat::{repeat, RepeatItem, RepeatSource};
pub use when::{when, when_with};
pub use compare::{is, one_of};
