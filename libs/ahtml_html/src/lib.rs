//! Metadata about HTML elements: which ones are void, which event
//! handler attributes exist, and which element properties do not
//! mirror their attributes.

pub mod types;
pub mod meta;
