//! Environment variable helpers
//!
//! Configuration in Stageload is read from the process environment with
//! compiled-in defaults. These helpers keep the loaders short.

use std::str::FromStr;

/// Read a string variable, falling back to `default` when unset
pub fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a variable that is allowed to be absent; empty values count as absent
pub fn var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a variable, falling back to `default` when unset or unparseable
pub fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read and parse a variable, reporting a parse failure instead of hiding it
pub fn parse_strict<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}
