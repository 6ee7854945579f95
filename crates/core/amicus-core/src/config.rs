//! Environment-backed configuration
//!
//! All runtime settings come from environment variables, optionally seeded
//! from a `.env` file at startup. Typed lookup helpers keep the call sites
//! short and the defaults in one place.

use crate::{AmicusError, Result};
use std::env;
use std::path::Path;

/// Seed the process environment from a `.env` file, if one exists
///
/// A missing file is fine; the process environment is used as-is. A file
/// that exists but does not parse is an error, so a typo cannot silently
/// drop settings.
///
/// # Example
///
/// ```no_run
/// use amicus_core::load_env;
///
/// load_env().ok();
/// let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
/// ```
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(AmicusError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::warn!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(AmicusError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Seed the process environment from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(AmicusError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Look up a variable that must be set, failing with a pointer at `.env`
pub fn get_required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        AmicusError::config(format!(
            "Required environment variable '{}' is not set. \
             Check your .env file or system environment.",
            key
        ))
    })
}

/// Look up a variable, falling back to a default when unset
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Look up a boolean variable; accepts true/false, 1/0, yes/no, on/off
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Look up an integer variable; unset or unparseable values fall back
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_bool() {
        env::set_var("TEST_BOOL_TRUE", "true");
        env::set_var("TEST_BOOL_FALSE", "false");

        assert_eq!(get_env_bool("TEST_BOOL_TRUE", false), true);
        assert_eq!(get_env_bool("TEST_BOOL_FALSE", true), false);
        assert_eq!(get_env_bool("NONEXISTENT_BOOL", true), true);
        assert_eq!(get_env_bool("NONEXISTENT_BOOL", false), false);

        env::remove_var("TEST_BOOL_TRUE");
        env::remove_var("TEST_BOOL_FALSE");
    }

    #[test]
    fn test_get_env_int() {
        env::set_var("TEST_INT", "3001");
        assert_eq!(get_env_int("TEST_INT", 0u16), 3001);
        assert_eq!(get_env_int("NONEXISTENT_INT", 99u16), 99);
        env::remove_var("TEST_INT");
    }

    #[test]
    fn test_get_env_or() {
        env::set_var("TEST_STRING", "hello");
        assert_eq!(get_env_or("TEST_STRING", "default"), "hello");
        assert_eq!(get_env_or("NONEXISTENT_STRING", "default"), "default");
        env::remove_var("TEST_STRING");
    }
}
