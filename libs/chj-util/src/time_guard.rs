//! # Tools for performance debugging.

//! `time_guard!` reports the time spent until the end of the current
//! scope. It is only enabled if the `TIME_GUARD` env var is set to a
//! truthy value or `enabled_set(true)` was called in the thread. It
//! can be statically disabled (compiled out completely) by using
//! `notime_guard!` instead.

use std::{time::Instant, fmt::Debug, cell::Cell};

use crate::env::env_flag;

thread_local!{
    pub static ENABLED: Cell<bool> = Cell::new(env_flag("TIME_GUARD"));
}

/// Enable `time_guard!`.
pub fn enabled_set(on: bool) {
    ENABLED.with(|cell| cell.set(on))
}

pub fn enabled() -> bool {
    ENABLED.with(|old| old.get())
}

pub enum TimeGuard<S: Debug> {
    Disabled,
    Enabled {
        name: S,
        start: Instant
    },
}

impl<S: Debug> Drop for TimeGuard<S> {
    fn drop(&mut self) {
        match self {
            TimeGuard::Disabled => (),
            TimeGuard::Enabled { name, start } => {
                let elapsed = start.elapsed();
                eprintln!("{:?}: {:#?}", name, elapsed);
            },
        }
    }
}

#[macro_export]
macro_rules! time_guard {
    ($namestr:expr) => {
        let _guard = if $crate::time_guard::enabled() {
            $crate::time_guard::TimeGuard::Enabled {
                name: $namestr,
                start: std::time::Instant::now()
            }
        } else {
            $crate::time_guard::TimeGuard::Disabled
        };
    }
}

#[macro_export]
macro_rules! notime_guard {
    ($namestr:expr) => {}
}
