//! Default values for Verdict configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

use super::RendererKind;

// ============================================================================
// File Locations
// ============================================================================

/// Project-local configuration file.
pub const CONFIG_FILE_NAME: &str = "verdict.toml";

/// Directory under the user config dir (e.g. `~/.config/verdict`).
pub const CONFIG_DIR_NAME: &str = "verdict";

/// File name inside the user config directory.
pub const USER_CONFIG_FILE_NAME: &str = "config.toml";

// ============================================================================
// Environment Overrides
// ============================================================================

/// Comma-separated suite names to run.
pub const ENV_SUITES: &str = "VERDICT_SUITES";

/// Test-name regex matched against `<case>::<test>`.
pub const ENV_FILTER: &str = "VERDICT_FILTER";

/// Log level or `tracing` filter directive.
pub const ENV_LOG: &str = "VERDICT_LOG";

// ============================================================================
// Logging Defaults
// ============================================================================

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_ANSI: bool = true;

// ============================================================================
// Render Defaults
// ============================================================================

pub const DEFAULT_RENDERER: RendererKind = RendererKind::Log;
