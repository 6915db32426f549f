//! A collection of utilities shared between my crates

pub mod env;
pub mod warn;
pub mod dt;
pub mod time_guard;
