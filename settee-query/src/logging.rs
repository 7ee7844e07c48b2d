//! Structured logging for settee.
//!
//! Query compilation and execution emit `tracing` events under the
//! `settee_query` and `settee_memory` targets. Nothing is printed unless a
//! subscriber is installed, either by the application or through [`init`]
//! (requires the `tracing-subscriber` feature).
//!
//! # Environment Variables
//!
//! - `SETTEE_DEBUG=true|1|yes` - Enable debug logging
//! - `SETTEE_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `SETTEE_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use settee_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "SETTEE_DEBUG";
const LEVEL_VAR: &str = "SETTEE_LOG_LEVEL";
const FORMAT_VAR: &str = "SETTEE_LOG_FORMAT";

/// Check if `SETTEE_DEBUG` enables debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    flag_enabled(env::var(DEBUG_VAR).ok().as_deref())
}

/// Log level from `SETTEE_LOG_LEVEL`, falling back to `debug` when
/// `SETTEE_DEBUG` is set and `warn` otherwise.
pub fn get_log_level() -> &'static str {
    resolve_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// Output format from `SETTEE_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var(FORMAT_VAR).ok().as_deref())
}

fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match requested.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(dead_code))]
fn filter_directives(level: &str) -> String {
    format!(
        "settee={},settee_query={},settee_memory={}",
        level, level, level
    )
}

/// Install a global subscriber according to the environment.
///
/// Does nothing unless `SETTEE_DEBUG` or `SETTEE_LOG_LEVEL` is set. Only the
/// first call has an effect.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directives(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // try_init: the application may already own the global subscriber
            let installed = match get_log_format() {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = get_log_format(), "settee logging initialized");
            }
        }
    });
}

/// Initialize logging at a specific level.
///
/// # Safety
///
/// Sets `SETTEE_LOG_LEVEL`, which races with any other thread reading the
/// environment. Call it at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Initialize debug logging, as if `SETTEE_DEBUG=true` were set.
///
/// # Safety
///
/// Same constraint as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert!(flag_enabled(Some("true")));
        assert!(flag_enabled(Some("YES")));
        assert!(flag_enabled(Some("1")));
        assert!(!flag_enabled(Some("0")));
        assert!(!flag_enabled(None));
    }

    #[test]
    fn test_level_resolution() {
        assert_eq!(resolve_level(None, false), "warn");
        assert_eq!(resolve_level(None, true), "debug");
        assert_eq!(resolve_level(Some("TRACE"), false), "trace");
        assert_eq!(resolve_level(Some("loud"), false), "warn");
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(resolve_format(None), "json");
        assert_eq!(resolve_format(Some("Compact")), "compact");
        assert_eq!(resolve_format(Some("pretty")), "pretty");
    }

    #[test]
    fn test_filter_covers_all_crates() {
        let directives = filter_directives("debug");
        assert!(directives.contains("settee_query=debug"));
        assert!(directives.contains("settee_memory=debug"));
    }
}
