//! Discovery result types.

use std::path::PathBuf;

use crate::catalog::{Arch, CompilerPackage};

/// A concrete installation discovered by one of the enumeration sources.
///
/// Ties a catalog entry to what was actually found on the machine: the
/// setup script to run, the resolved display name and version, and any
/// per-architecture switch overrides (Express editions drive x64 through
/// the cross compiler). Never mutated after creation.
#[derive(Debug, Clone)]
pub struct FoundInstallation {
    /// Mapping key: the package key, extended with a minor version for
    /// dynamically discovered generations ("VS17.8") and with an instance
    /// id in list-installed mode ("VS17.8-0f3cbe13").
    pub key: String,
    /// The catalog entry this installation belongs to.
    pub package: &'static CompilerPackage,
    /// Absolute path of the setup script.
    pub setup_script: PathBuf,
    /// Display name; may carry an "Express" qualifier or the name reported
    /// by the enumeration tool.
    pub name: String,
    /// Resolved version string.
    pub version: String,
    /// Overrides of the catalog's per-architecture setup switches.
    pub switch_overrides: Vec<(Arch, String)>,
}

impl FoundInstallation {
    /// Whether this installation can target `arch`.
    pub fn supports(&self, arch: Arch) -> bool {
        self.package.supports(arch)
    }

    /// The setup-script switch for `arch`: override first, catalog second.
    pub fn switch_for(&self, arch: Arch) -> Option<String> {
        self.switch_overrides
            .iter()
            .find(|(a, _)| *a == arch)
            .map(|(_, s)| s.clone())
            .or_else(|| self.package.switch_for(arch).map(str::to_string))
    }
}
