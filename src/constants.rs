// src/constants.rs

/// Name of the per-user directory holding scriptdeck's configuration.
pub const PRODUCT_DIR: &str = "scriptdeck";

/// Name of the persisted settings file (inside the product directory).
pub const SETTINGS_FILENAME: &str = "settings.json";

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "SCRIPTDECK_CONFIG_DIR";

/// Every metadata directive starts with this prefix, at column 0.
pub const DIRECTIVE_PREFIX: &str = "# @raycast.";

/// Scripts declare at most this many positional arguments.
pub const MAX_ARGUMENTS: usize = 3;

/// Inline scripts are never refreshed more often than this.
pub const MIN_REFRESH_SECS: u64 = 10;

/// Shown when a captured script produced no usable output line.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Script executed successfully.";

/// Shell used when `bashPath` is empty.
pub const DEFAULT_SHELL: &str = "bash";
