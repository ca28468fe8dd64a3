//! Fixed registry scan for legacy Visual Studio generations (7.0–14.0).
//!
//! Each legacy generation advertises itself through a tools-root
//! environment variable (`VS140COMNTOOLS` and friends). A candidate is
//! recorded only when the variable is set, its directory contains the
//! legacy marker script, and an installation root can be resolved from
//! the registry (with an Express-edition fallback and one hardcoded
//! special case). Anything missing silently skips the entry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{Arch, CATALOG};
use crate::enumerate::registry::Registry;
use crate::enumerate::types::FoundInstallation;

const VS_REGISTRY: &str = r"HKLM\SOFTWARE\Microsoft\VisualStudio";
const VCEXPRESS_REGISTRY: &str = r"HKLM\SOFTWARE\Microsoft\VCExpress";

/// Marker script every legacy generation ships in its tools directory.
const TOOLS_MARKER: &str = "vsvars32.bat";

/// Scan all legacy catalog entries into `found`.
pub fn scan<F>(
    registry: &dyn Registry,
    env_fn: F,
    found: &mut BTreeMap<String, FoundInstallation>,
) where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    for package in CATALOG.iter().filter(|p| p.tools_env.is_some()) {
        let tools_env = package.tools_env.unwrap_or_default();
        let Ok(tools_dir) = env_fn(tools_env) else {
            continue;
        };
        let tools_dir = PathBuf::from(tools_dir);
        if !tools_dir.join(TOOLS_MARKER).is_file() {
            tracing::debug!("{}: {} set but no {}", package.key, tools_env, TOOLS_MARKER);
            continue;
        }

        let Some(version) = package.registry_version() else {
            continue;
        };

        let (product_dir, express) = match resolve_product_dir(registry, version, &tools_dir) {
            Some(resolved) => resolved,
            None => {
                tracing::debug!("{}: no installation root in registry", package.key);
                continue;
            }
        };

        // VS7.x setup lives in the tools directory itself; later
        // generations concatenate the product root with the VC script.
        let setup_script = if version.starts_with("7.") {
            tools_dir.join(TOOLS_MARKER)
        } else {
            product_dir.join("VC").join("vcvarsall.bat")
        };
        if !setup_script.is_file() {
            tracing::debug!("{}: setup script {:?} missing", package.key, setup_script);
            continue;
        }

        let mut name = package.name.to_string();
        let mut switch_overrides = Vec::new();
        if express {
            name.push_str(" Express");
            // Express editions have no native x64 compiler; the cross
            // compiler is selected instead.
            if package.supports(Arch::X64) {
                switch_overrides.push((Arch::X64, "x86_amd64".to_string()));
            }
        }

        tracing::debug!("{}: found {} at {:?}", package.key, name, setup_script);
        found.insert(
            package.key.to_string(),
            FoundInstallation {
                key: package.key.to_string(),
                package,
                setup_script,
                name,
                version: version.to_string(),
                switch_overrides,
            },
        );
    }
}

/// Resolve the installation root: normal registry value, then the Express
/// path, then the VS7.1 special case (its installer is known to omit the
/// registry value; the root is two levels above the tools directory).
fn resolve_product_dir(
    registry: &dyn Registry,
    version: &str,
    tools_dir: &Path,
) -> Option<(PathBuf, bool)> {
    let key = format!(r"{}\{}\Setup\VS", VS_REGISTRY, version);
    if let Some(dir) = registry.value(&key, "ProductDir") {
        return Some((PathBuf::from(dir), false));
    }

    let express_key = format!(r"{}\{}\Setup\VS", VCEXPRESS_REGISTRY, version);
    if let Some(dir) = registry.value(&express_key, "ProductDir") {
        return Some((PathBuf::from(dir), true));
    }

    if version == "7.1" {
        let root = tools_dir.parent()?.parent()?;
        return Some((root.to_path_buf(), false));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    struct FakeRegistry(HashMap<(String, String), String>);

    impl FakeRegistry {
        fn empty() -> Self {
            Self(HashMap::new())
        }

        fn with(entries: &[(&str, &str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(k, n, v)| ((k.to_string(), n.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl Registry for FakeRegistry {
        fn value(&self, key: &str, name: &str) -> Option<String> {
            self.0.get(&(key.to_string(), name.to_string())).cloned()
        }

        fn subkeys(&self, _key: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn make_env(vars: &[(&str, String)]) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        move |key: &str| map.get(key).cloned().ok_or(std::env::VarError::NotPresent)
    }

    /// Lay out a legacy VS install: root with VC\vcvarsall.bat and
    /// Common7\Tools\vsvars32.bat.
    fn fake_vs_install(temp: &TempDir) -> (PathBuf, PathBuf) {
        let root = temp.path().join("VS14");
        let tools = root.join("Common7").join("Tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join(TOOLS_MARKER), "").unwrap();
        let vc = root.join("VC");
        fs::create_dir_all(&vc).unwrap();
        fs::write(vc.join("vcvarsall.bat"), "").unwrap();
        (root, tools)
    }

    #[test]
    fn full_checks_record_installation() {
        let temp = TempDir::new().unwrap();
        let (root, tools) = fake_vs_install(&temp);

        let registry = FakeRegistry::with(&[(
            r"HKLM\SOFTWARE\Microsoft\VisualStudio\14.0\Setup\VS",
            "ProductDir",
            &root.display().to_string(),
        )]);
        let env_fn = make_env(&[("VS140COMNTOOLS", tools.display().to_string())]);

        let mut found = BTreeMap::new();
        scan(&registry, env_fn, &mut found);

        let install = found.get("VS14.0").expect("VS14.0 recorded");
        assert_eq!(install.name, "Visual Studio 2015");
        assert_eq!(install.version, "14.0");
        assert_eq!(install.setup_script, root.join("VC").join("vcvarsall.bat"));
        assert!(install.switch_overrides.is_empty());
    }

    #[test]
    fn unset_tools_variable_skips_entry() {
        let registry = FakeRegistry::empty();
        let mut found = BTreeMap::new();
        scan(&registry, make_env(&[]), &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn missing_marker_script_skips_entry() {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("Tools");
        fs::create_dir_all(&tools).unwrap();

        let env_fn = make_env(&[("VS140COMNTOOLS", tools.display().to_string())]);
        let mut found = BTreeMap::new();
        scan(&FakeRegistry::empty(), env_fn, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn missing_registry_value_skips_entry() {
        let temp = TempDir::new().unwrap();
        let (_root, tools) = fake_vs_install(&temp);

        let env_fn = make_env(&[("VS140COMNTOOLS", tools.display().to_string())]);
        let mut found = BTreeMap::new();
        scan(&FakeRegistry::empty(), env_fn, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn express_fallback_qualifies_name_and_overrides_switch() {
        let temp = TempDir::new().unwrap();
        let (root, tools) = fake_vs_install(&temp);

        let registry = FakeRegistry::with(&[(
            r"HKLM\SOFTWARE\Microsoft\VCExpress\14.0\Setup\VS",
            "ProductDir",
            &root.display().to_string(),
        )]);
        let env_fn = make_env(&[("VS140COMNTOOLS", tools.display().to_string())]);

        let mut found = BTreeMap::new();
        scan(&registry, env_fn, &mut found);

        let install = found.get("VS14.0").expect("express install recorded");
        assert_eq!(install.name, "Visual Studio 2015 Express");
        assert_eq!(install.switch_for(Arch::X64).as_deref(), Some("x86_amd64"));
        assert_eq!(install.switch_for(Arch::X86).as_deref(), Some("x86"));
    }

    #[test]
    fn vs71_special_case_walks_up_from_tools_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("VS2003");
        let tools = root.join("Common7").join("Tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join(TOOLS_MARKER), "").unwrap();

        let env_fn = make_env(&[("VS71COMNTOOLS", tools.display().to_string())]);
        let mut found = BTreeMap::new();
        scan(&FakeRegistry::empty(), env_fn, &mut found);

        let install = found.get("VS7.1").expect("VS7.1 recorded via special case");
        // VS7.x runs the marker script itself, no architecture switch.
        assert_eq!(install.setup_script, tools.join(TOOLS_MARKER));
        assert_eq!(install.switch_for(Arch::X86), None);
    }

    #[test]
    fn vs70_has_no_special_case() {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("VS2002").join("Common7").join("Tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join(TOOLS_MARKER), "").unwrap();

        let env_fn = make_env(&[("VS70COMNTOOLS", tools.display().to_string())]);
        let mut found = BTreeMap::new();
        scan(&FakeRegistry::empty(), env_fn, &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn missing_vcvarsall_skips_modern_entry() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("VS14");
        let tools = root.join("Common7").join("Tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join(TOOLS_MARKER), "").unwrap();
        // No VC\vcvarsall.bat.

        let registry = FakeRegistry::with(&[(
            r"HKLM\SOFTWARE\Microsoft\VisualStudio\14.0\Setup\VS",
            "ProductDir",
            &root.display().to_string(),
        )]);
        let env_fn = make_env(&[("VS140COMNTOOLS", tools.display().to_string())]);

        let mut found = BTreeMap::new();
        scan(&registry, env_fn, &mut found);
        assert!(found.is_empty());
    }
}
