//! Terminal output utilities
//!
//! Everything except errors is suppressed in quiet mode.

use std::sync::atomic::{AtomicBool, Ordering};

use console::style;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Enable or disable quiet mode
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// Whether quiet mode is on
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", style("✓").green().bold(), msg);
    }
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    if !is_quiet() {
        println!("\n{}", style(msg).bold().underlined());
    }
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    if !is_quiet() {
        println!("  {}: {}", style(key).dim(), value);
    }
}

/// Print a plain line
pub fn line(msg: &str) {
    if !is_quiet() {
        println!("{}", msg);
    }
}
