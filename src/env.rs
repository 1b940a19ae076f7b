//! Environment filtering for attempt subprocesses.
//!
//! Attempts must reach their target directly, so proxy variables inherited
//! by the runner are dropped before each launch. Everything else passes
//! through untouched.

use std::ffi::{OsStr, OsString};

/// Proxy variables removed from every attempt environment.
pub const PROXY_VARS: &[&str] = &["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "NO_PROXY"];

/// Returns true when `name` is a proxy variable, ignoring ASCII case.
pub fn is_proxy_var(name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    PROXY_VARS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

/// Filters proxy variables out of `vars`, keeping the rest as given.
pub fn sanitized_env<I>(vars: I) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter(|(name, _)| !is_proxy_var(name))
        .collect()
}

/// The current process environment without proxy variables.
pub fn current_sanitized_env() -> Vec<(OsString, OsString)> {
    sanitized_env(std::env::vars_os())
}
