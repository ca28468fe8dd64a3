//! Registry access seam.
//!
//! Enumeration reads installation metadata from the Windows registry. The
//! [`Registry`] trait keeps that dependency behind a seam so scans can be
//! unit-tested with in-memory fakes; the production implementation shells
//! out to `reg.exe`, which also works from environments like Cygwin/MSYS
//! where no registry API bindings are available. A missing `reg.exe`
//! yields no values, never an error.

use std::process::Command;

use crate::probe::{run_with_timeout, TOOL_TIMEOUT};

/// Read-only view of registry keys used during enumeration.
pub trait Registry {
    /// The string value `name` under `key`, if present.
    fn value(&self, key: &str, name: &str) -> Option<String>;

    /// Immediate subkey names of `key` (last path component only).
    fn subkeys(&self, key: &str) -> Vec<String>;
}

/// Registry access via `reg.exe query`.
///
/// Values are looked up in the native view first, then under
/// `WOW6432Node` (32-bit installers on 64-bit Windows register there).
pub struct SystemRegistry;

impl Registry for SystemRegistry {
    fn value(&self, key: &str, name: &str) -> Option<String> {
        for key in views_of(key) {
            let mut command = Command::new("reg.exe");
            command.args(["query", key.as_str(), "/v", name]);
            if let Some(output) = run_with_timeout(command, TOOL_TIMEOUT) {
                if let Some(value) = parse_value_output(&output, name) {
                    return Some(value);
                }
            }
        }
        None
    }

    fn subkeys(&self, key: &str) -> Vec<String> {
        for key in views_of(key) {
            let mut command = Command::new("reg.exe");
            command.args(["query", key.as_str()]);
            if let Some(output) = run_with_timeout(command, TOOL_TIMEOUT) {
                let subkeys = parse_subkey_output(&output, &key);
                if !subkeys.is_empty() {
                    return subkeys;
                }
            }
        }
        Vec::new()
    }
}

/// The native key plus its `WOW6432Node` variant, in lookup order.
fn views_of(key: &str) -> Vec<String> {
    let mut views = vec![key.to_string()];
    if let Some(rest) = key.strip_prefix("HKLM\\SOFTWARE\\") {
        if !rest.starts_with("WOW6432Node\\") {
            views.push(format!("HKLM\\SOFTWARE\\WOW6432Node\\{}", rest));
        }
    }
    views
}

/// Extract `name`'s data from `reg query /v` output.
///
/// Value lines look like `    ProductDir    REG_SZ    C:\...`; the value
/// name itself may contain spaces, so the line is matched by prefix and
/// the type token located explicitly.
fn parse_value_output(output: &str, name: &str) -> Option<String> {
    for line in output.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(name) else {
            continue;
        };
        let rest = rest.trim_start();
        let mut parts = rest.splitn(2, char::is_whitespace);
        let value_type = parts.next()?;
        if !value_type.starts_with("REG_") {
            continue;
        }
        let data = parts.next()?.trim();
        if !data.is_empty() {
            return Some(data.to_string());
        }
    }
    None
}

/// Extract subkey names from `reg query` output: lines that repeat the
/// queried key path with one more component.
fn parse_subkey_output(output: &str, key: &str) -> Vec<String> {
    let prefix = format!("{}\\", key.to_lowercase());
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.to_lowercase().starts_with(&prefix))
        .filter_map(|line| line.rsplit('\\').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
