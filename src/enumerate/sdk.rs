//! Windows SDK scan.
//!
//! Standalone SDKs register under `Microsoft SDKs\Windows` with one
//! version-named subkey per install. Each is recorded when its
//! installation folder contains the SDK setup script. Versions missing
//! from the catalog are still recorded, with an "assumed compatible"
//! display name. The Windows Server 2003 SP1 SDK predates that registry
//! layout and is probed separately through its fixed GUID key.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;

use crate::catalog::{self, GENERIC_SDK};
use crate::enumerate::registry::Registry;
use crate::enumerate::types::FoundInstallation;

const SDK_REGISTRY: &str = r"HKLM\SOFTWARE\Microsoft\Microsoft SDKs\Windows";
const LEGACY_SDK_REGISTRY: &str =
    r"HKLM\SOFTWARE\Microsoft\MicrosoftSDK\InstalledSDKs\{8F9E5EF3-A9A5-491B-A889-C58EFFECE8B3}";

/// Scan registered SDKs into `found`.
pub fn scan(registry: &dyn Registry, found: &mut BTreeMap<String, FoundInstallation>) {
    // Subkeys look like "v7.1"; anything else is not an SDK version.
    let version_key = Regex::new(r"^v(\d+\.\d+)$").unwrap();

    for subkey in registry.subkeys(SDK_REGISTRY) {
        let Some(captures) = version_key.captures(&subkey) else {
            continue;
        };
        let version = captures[1].to_string();

        let key = format!(r"{}\{}", SDK_REGISTRY, subkey);
        let Some(install_dir) = registry.value(&key, "InstallationFolder") else {
            tracing::debug!("SDK {}: no InstallationFolder", subkey);
            continue;
        };

        let setup_script = PathBuf::from(&install_dir).join("Bin").join("SetEnv.cmd");
        if !setup_script.is_file() {
            tracing::debug!("SDK {}: {:?} missing", subkey, setup_script);
            continue;
        }

        let product_version = registry
            .value(&key, "ProductVersion")
            .unwrap_or_else(|| version.clone());

        let package_key = format!("SDK{}", version);
        let (package, name) = match catalog::find(&package_key) {
            Some(package) => (package, package.name.to_string()),
            None => (
                &GENERIC_SDK,
                format!("Windows SDK {} (assumed compatible)", version),
            ),
        };

        tracing::debug!("{}: found {} at {:?}", package_key, name, setup_script);
        found.insert(
            package_key.clone(),
            FoundInstallation {
                key: package_key,
                package,
                setup_script,
                name,
                version: product_version,
                switch_overrides: Vec::new(),
            },
        );
    }

    scan_legacy_sdk(registry, found);
}

/// The Windows Server 2003 SP1 SDK: fixed GUID key, setup script directly
/// in the install root.
fn scan_legacy_sdk(registry: &dyn Registry, found: &mut BTreeMap<String, FoundInstallation>) {
    let Some(install_dir) = registry.value(LEGACY_SDK_REGISTRY, "Install Dir") else {
        return;
    };
    let setup_script = PathBuf::from(&install_dir).join("SetEnv.cmd");
    if !setup_script.is_file() {
        tracing::debug!("SDK5.2: {:?} missing", setup_script);
        return;
    }
    let Some(package) = catalog::find("SDK5.2") else {
        return;
    };

    tracing::debug!("SDK5.2: found at {:?}", setup_script);
    found.insert(
        "SDK5.2".to_string(),
        FoundInstallation {
            key: "SDK5.2".to_string(),
            package,
            setup_script,
            name: package.name.to_string(),
            version: "5.2".to_string(),
            switch_overrides: Vec::new(),
        },
    );
}
