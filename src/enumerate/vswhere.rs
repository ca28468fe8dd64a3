//! Dynamic instance enumeration via the external vswhere tool.
//!
//! Visual Studio 2017 and later no longer register fixed paths; instances
//! are enumerated by `vswhere.exe`, which ships at a well-known location
//! under Program Files. Its text output is a stream of `key: value` lines
//! where the display-name field terminates each record. An absent or
//! failing tool yields zero entries, never an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;

use crate::catalog;
use crate::enumerate::types::FoundInstallation;
use crate::probe::{run_with_timeout, TOOL_TIMEOUT};

/// One record parsed from the vswhere output stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Instance {
    instance_id: String,
    installation_path: String,
    installation_version: String,
    display_name: String,
}

/// Run the installed vswhere, asking for every instance including
/// prereleases. Returns the raw output stream, or `None` when the tool is
/// not installed or misbehaves.
pub fn run_vswhere<F>(env_fn: F) -> Option<String>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let binary = env_fn("ProgramFiles(x86)")
        .ok()
        .map(|dir| {
            Path::new(&dir)
                .join("Microsoft Visual Studio")
                .join("Installer")
                .join("vswhere.exe")
        })
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from("vswhere.exe"));

    let mut command = Command::new(binary);
    command.args(["-all", "-prerelease", "-nologo"]);
    run_with_timeout(command, TOOL_TIMEOUT)
}

/// Scan vswhere output into `found`.
///
/// With `instance_keys`, each entry's key carries the unique instance id
/// (side-by-side installs of one version stay distinguishable); without
/// it, the key is just the major.minor version, collapsing multiple
/// instances since only one will be tested.
pub fn scan(
    output: Option<&str>,
    instance_keys: bool,
    found: &mut BTreeMap<String, FoundInstallation>,
) {
    let Some(output) = output else {
        tracing::debug!("vswhere not available, skipping dynamic enumeration");
        return;
    };

    let version_prefix = Regex::new(r"^(\d+)\.(\d+)").unwrap();

    for instance in parse_records(output) {
        let Some(captures) = version_prefix.captures(&instance.installation_version) else {
            tracing::debug!(
                "vswhere instance {}: unparseable version {:?}",
                instance.instance_id,
                instance.installation_version
            );
            continue;
        };
        let (major, minor) = (&captures[1], &captures[2]);

        let Some(package) = catalog::find_vswhere_family(major) else {
            tracing::debug!("vswhere instance {}: unknown generation {}", instance.instance_id, major);
            continue;
        };

        let setup_script = Path::new(&instance.installation_path)
            .join("VC")
            .join("Auxiliary")
            .join("Build")
            .join("vcvarsall.bat");
        if !setup_script.is_file() {
            tracing::debug!(
                "vswhere instance {}: {:?} missing",
                instance.instance_id,
                setup_script
            );
            continue;
        }

        let mut key = format!("VS{}.{}", major, minor);
        if instance_keys && !instance.instance_id.is_empty() {
            key = format!("{}-{}", key, instance.instance_id);
        }

        tracing::debug!("{}: found {} at {:?}", key, instance.display_name, setup_script);
        found.entry(key.clone()).or_insert(FoundInstallation {
            key,
            package,
            setup_script,
            name: instance.display_name,
            version: instance.installation_version,
            switch_overrides: Vec::new(),
        });
    }
}

/// Split the `key: value` stream into records; a display-name field ends
/// the record being accumulated. Unterminated trailing fields (a record
/// with no display name) are dropped.
fn parse_records(output: &str) -> Vec<Instance> {
    let mut records = Vec::new();
    let mut current = Instance::default();

    for line in output.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match field.trim() {
            "instanceId" => current.instance_id = value,
            "installationPath" => current.installation_path = value,
            "installationVersion" => current.installation_version = value,
            "displayName" => {
                current.display_name = value;
                records.push(std::mem::take(&mut current));
            }
            _ => {}
        }
    }

    records
}
