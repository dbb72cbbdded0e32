//! Default values for gqlprobe configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Target Defaults
// ============================================================================

/// Seconds before a single request to the target is abandoned.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Separator between headers in `GQLPROBE_HEADERS`.
///
/// Header values may contain commas (`Accept: a, b`) and semicolons
/// (cookies) but never a line break.
pub const HEADERS_ENV_SEPARATOR: char = '\n';

// ============================================================================
// Introspection Defaults
// ============================================================================

/// Levels of `ofType` nesting requested by the first introspection query.
///
/// A non-null (1) list (2) of non-null (3) strings (4) needs a depth of 4.
pub const DEFAULT_INTROSPECTION_DEPTH: usize = 4;

/// Number of doubling re-queries allowed before a type is reported as
/// unresolvable.
pub const DEFAULT_MAX_INTROSPECTION_ATTEMPTS: usize = 6;

// ============================================================================
// Crawl Defaults
// ============================================================================

/// Root fields that are never tested. These are federation internals.
pub const ALWAYS_IGNORED_OPERATIONS: &[&str] = &["_entities", "_service"];

/// Whether a synthesis or compile failure aborts the whole crawl.
pub const DEFAULT_STRICT: bool = true;

// ============================================================================
// Synthesis Defaults
// ============================================================================

/// Value used for the custom `Time` scalar. `"now"` means the current time.
pub const DEFAULT_TIME_VALUE: &str = "now";

// ============================================================================
// Polling Defaults
// ============================================================================

/// Interval between schema reloads, in minutes.
pub const DEFAULT_POLLING_INTERVAL_MINUTES: u64 = 10;

// ============================================================================
// Server Defaults
// ============================================================================

/// Port the control server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// ============================================================================
// Config File Locations
// ============================================================================

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "gqlprobe.toml";

/// Directory name under the user config dir.
pub const USER_CONFIG_DIR: &str = "gqlprobe";

/// File name under the user config dir.
pub const USER_CONFIG_FILE: &str = "config.toml";
