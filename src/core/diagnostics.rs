//! Internal diagnostics channel
//!
//! The logger cannot report its own faults through itself, so configuration
//! problems, rollover failures and invariant breaches are written to stderr
//! with a `[LOGGER ...]` prefix. Debug output is off by default.

use std::backtrace::Backtrace;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable internal debug output
pub fn set_internal_debugging(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Suppress all internal output, including errors
pub fn set_quiet_mode(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

#[must_use]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed) && !QUIET_MODE.load(Ordering::Relaxed)
}

fn quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

pub fn debug(message: impl AsRef<str>) {
    if is_debug_enabled() {
        eprintln!("[LOGGER DEBUG] {}", message.as_ref());
    }
}

pub fn warn(message: impl AsRef<str>) {
    if !quiet() {
        eprintln!("[LOGGER WARN] {}", message.as_ref());
    }
}

pub fn error(message: impl AsRef<str>) {
    if !quiet() {
        eprintln!("[LOGGER ERROR] {}", message.as_ref());
    }
}

/// Report an error together with its source chain
pub fn error_with(message: impl AsRef<str>, err: &dyn Error) {
    if quiet() {
        return;
    }
    eprintln!("[LOGGER ERROR] {}: {}", message.as_ref(), err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("[LOGGER ERROR]   caused by: {}", cause);
        source = cause.source();
    }
}

/// Report a broken internal invariant. Always printed with a backtrace,
/// even in quiet mode.
pub fn invariant_violation(message: impl AsRef<str>) {
    eprintln!(
        "[LOGGER CRITICAL] {}\n{}",
        message.as_ref(),
        Backtrace::force_capture()
    );
}
