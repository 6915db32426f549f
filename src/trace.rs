//! Runtime switch for engine trace output (`MARKUP_TRACE` env var).

use std::sync::atomic::{AtomicBool, Ordering};
use chj_util::env::env_flag;
use lazy_static::lazy_static;

lazy_static!{
    /// Log cache misses, wiring and reactive rewrites via `warn!`.
    pub static ref TRACE: AtomicBool = AtomicBool::new(env_flag("MARKUP_TRACE"));
}

pub fn set_trace(on: bool) {
    TRACE.store(on, Ordering::Relaxed)
}

pub fn trace_enabled() -> bool {
    TRACE.load(Ordering::Relaxed)
}
