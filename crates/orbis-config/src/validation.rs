// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::OrbisConfig;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OrbisConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.plugins.directory.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "plugins.directory must not be empty".to_string(),
        });
    }

    if config.plugins.init_timeout_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message: "plugins.init_timeout_secs must be greater than 0 (omit it to wait indefinitely)"
                .to_string(),
        });
    }

    if config.plugins.unload_timeout_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message:
                "plugins.unload_timeout_secs must be greater than 0 (omit it to wait indefinitely)"
                    .to_string(),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
