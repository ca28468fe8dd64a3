//! Candidate validation.
//!
//! A probed (candidate, architecture) pair only enters the validated set
//! when every file a working toolchain needs is present in its
//! PATH/INCLUDE/LIB directories. Checks run in fixed groups (compiler
//! tools, SDK, runtime, then the optional assembler and manifest tool)
//! and stop at the first incomplete group, so a diagnostic names the
//! capability that is missing. A failed validation excludes the pair and
//! nothing else.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::Arch;
use crate::enumerate::FoundInstallation;
use crate::probe::{files, ProbedEnvironment};

/// Which optional tools a caller requires on top of the core toolchain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolRequirements {
    pub assembler: bool,
    pub manifest_tool: bool,
}

/// Side output of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTools {
    /// Resolved assembler filename, when one was required.
    pub assembler: Option<String>,
}

/// The assembler binary for an architecture.
pub fn assembler_for(arch: Arch) -> &'static str {
    match arch {
        Arch::X86 => "ml.exe",
        Arch::X64 => "ml64.exe",
    }
}

/// Validate one (candidate, architecture) pair's directory sets.
///
/// Returns `None` as soon as one group is incomplete; the exclusion is
/// logged, never raised.
pub fn validate(
    path_dirs: &str,
    inc_dirs: &str,
    lib_dirs: &str,
    name: &str,
    arch: Arch,
    requirements: ToolRequirements,
) -> Option<ValidatedTools> {
    let groups: [(&str, &[(&str, &str)]); 3] = [
        ("compiler", &[("cl.exe", "PATH"), ("link.exe", "PATH")]),
        (
            "SDK",
            &[
                ("rc.exe", "PATH"),
                ("windows.h", "INCLUDE"),
                ("kernel32.lib", "LIB"),
            ],
        ),
        (
            "runtime",
            &[
                ("stdlib.h", "INCLUDE"),
                ("msvcrt.lib", "LIB"),
                ("oldnames.lib", "LIB"),
            ],
        ),
    ];

    for (group, checks) in groups {
        for (file, list_name) in checks {
            let list = match *list_name {
                "PATH" => path_dirs,
                "INCLUDE" => inc_dirs,
                _ => lib_dirs,
            };
            if !files::find_in_dirs(list, file) {
                tracing::debug!("{} ({}): incomplete {} group, {} not found", name, arch, group, file);
                return None;
            }
        }
    }

    let mut assembler = None;
    if requirements.assembler {
        let ml = assembler_for(arch);
        if !files::find_in_dirs(path_dirs, ml) {
            tracing::debug!("{} ({}): assembler {} not found", name, arch, ml);
            return None;
        }
        assembler = Some(ml.to_string());
    }

    if requirements.manifest_tool && !files::find_in_dirs(path_dirs, "mt.exe") {
        tracing::debug!("{} ({}): manifest tool mt.exe not found", name, arch);
        return None;
    }

    Some(ValidatedTools { assembler })
}

/// A candidate narrowed to one architecture after probing and validation.
///
/// Directory lists are the prober's normalized, duplicate-preserving,
/// separator-terminated strings.
#[derive(Debug, Clone)]
pub struct ValidatedCompiler {
    /// `"{package-key}-{arch}"`; unique across the validated set.
    pub key: String,
    /// The discovery key of the underlying installation.
    pub package_key: String,
    /// Display name of the installation.
    pub name: String,
    /// Resolved version string of the installation.
    pub version: String,
    pub arch: Arch,
    pub setup_script: PathBuf,
    /// Switch passed to the setup script for this architecture.
    pub setup_switch: Option<String>,
    /// VC runtime generation of the underlying package (SDK matching).
    pub runtime_version: Option<String>,
    /// Directories the setup script prepended to PATH.
    pub path: String,
    pub include: String,
    pub lib: String,
    /// Resolved assembler filename, when required.
    pub assembler: Option<String>,
    pub tools_version: Option<String>,
    pub sdk_version: Option<String>,
}

/// Validated candidates keyed by `"{package-key}-{arch}"`. A `BTreeMap`
/// keeps iteration lexicographic, which keeps ambiguity collapse in the
/// environment matcher and weak-fallback adoption reproducible.
pub type ValidatedSet = BTreeMap<String, ValidatedCompiler>;

/// The validated-set key for a (package, architecture) pair.
pub fn set_key(package_key: &str, arch: Arch) -> String {
    format!("{}-{}", package_key, arch)
}

/// Look up the validated entry for a (package, architecture) pair.
pub fn get<'a>(set: &'a ValidatedSet, package_key: &str, arch: Arch) -> Option<&'a ValidatedCompiler> {
    set.get(&set_key(package_key, arch))
}

impl ValidatedCompiler {
    /// Assemble an entry from an installation, its probed environment,
    /// and the validator's side output.
    pub fn assemble(
        found: &FoundInstallation,
        arch: Arch,
        probed: ProbedEnvironment,
        tools: ValidatedTools,
    ) -> Self {
        Self {
            key: set_key(&found.key, arch),
            package_key: found.key.clone(),
            name: found.name.clone(),
            version: found.version.clone(),
            arch,
            setup_script: found.setup_script.clone(),
            setup_switch: found.switch_for(arch),
            runtime_version: found.package.runtime_version.map(str::to_string),
            path: probed.path,
            include: probed.include,
            lib: probed.lib,
            assembler: tools.assembler,
            tools_version: probed.tools_version,
            sdk_version: probed.sdk_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Layout {
        _temp: TempDir,
        path: String,
        include: String,
        lib: String,
    }

    fn touch(dir: &Path, files: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for file in files {
            fs::write(dir.join(file), "").unwrap();
        }
    }

    /// A directory layout containing every core toolchain file, plus any
    /// extra PATH binaries.
    fn full_layout(extra_bins: &[&str]) -> Layout {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        let inc = temp.path().join("include");
        let lib = temp.path().join("lib");

        let mut bins = vec!["cl.exe", "link.exe", "rc.exe"];
        bins.extend_from_slice(extra_bins);
        touch(&bin, &bins);
        touch(&inc, &["windows.h", "stdlib.h"]);
        touch(&lib, &["kernel32.lib", "msvcrt.lib", "oldnames.lib"]);

        Layout {
            path: format!("{};", bin.display()),
            include: format!("{};", inc.display()),
            lib: format!("{};", lib.display()),
            _temp: temp,
        }
    }

    #[test]
    fn complete_layout_validates() {
        let layout = full_layout(&[]);
        let tools = validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X86,
            ToolRequirements::default(),
        )
        .expect("complete layout validates");
        assert_eq!(tools.assembler, None);
    }

    #[test]
    fn missing_compiler_fails() {
        let layout = full_layout(&[]);
        fs::remove_file(Path::new(layout.path.trim_end_matches(';')).join("cl.exe")).unwrap();
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X86,
            ToolRequirements::default(),
        )
        .is_none());
    }

    #[test]
    fn missing_one_runtime_file_fails_despite_everything_else() {
        let layout = full_layout(&[]);
        fs::remove_file(Path::new(layout.lib.trim_end_matches(';')).join("msvcrt.lib")).unwrap();
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X64,
            ToolRequirements::default(),
        )
        .is_none());
    }

    #[test]
    fn missing_sdk_header_fails() {
        let layout = full_layout(&[]);
        fs::remove_file(Path::new(layout.include.trim_end_matches(';')).join("windows.h")).unwrap();
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "SDK7.1",
            Arch::X86,
            ToolRequirements::default(),
        )
        .is_none());
    }

    #[test]
    fn required_assembler_resolves_per_arch() {
        let layout = full_layout(&["ml.exe", "ml64.exe"]);
        let requirements = ToolRequirements {
            assembler: true,
            manifest_tool: false,
        };

        let x86 = validate(&layout.path, &layout.include, &layout.lib, "VS14.0", Arch::X86, requirements)
            .unwrap();
        assert_eq!(x86.assembler.as_deref(), Some("ml.exe"));

        let x64 = validate(&layout.path, &layout.include, &layout.lib, "VS14.0", Arch::X64, requirements)
            .unwrap();
        assert_eq!(x64.assembler.as_deref(), Some("ml64.exe"));
    }

    #[test]
    fn required_assembler_missing_fails() {
        let layout = full_layout(&["ml.exe"]);
        let requirements = ToolRequirements {
            assembler: true,
            manifest_tool: false,
        };
        // x64 needs ml64.exe, only ml.exe is present.
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X64,
            requirements,
        )
        .is_none());
    }

    #[test]
    fn required_manifest_tool_checked_last() {
        let layout = full_layout(&[]);
        let requirements = ToolRequirements {
            assembler: false,
            manifest_tool: true,
        };
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X86,
            requirements,
        )
        .is_none());

        let layout = full_layout(&["mt.exe"]);
        assert!(validate(
            &layout.path,
            &layout.include,
            &layout.lib,
            "VS14.0",
            Arch::X86,
            requirements,
        )
        .is_some());
    }

    #[test]
    fn empty_lists_fail_without_error() {
        assert!(validate("", "", "", "nothing", Arch::X86, ToolRequirements::default()).is_none());
    }

    #[test]
    fn set_key_format() {
        assert_eq!(set_key("VS14.0", Arch::X64), "VS14.0-x64");
        assert_eq!(set_key("SDK7.1", Arch::X86), "SDK7.1-x86");
    }
}
