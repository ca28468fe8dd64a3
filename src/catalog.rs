//! Static catalog of Microsoft toolchain generations.
//!
//! Every toolchain family this tool can discover is described by a
//! [`CompilerPackage`] entry in [`CATALOG`]. Entries are plain read-only
//! records; discovery fills in the concrete details at enumeration time.
//! No two entries share a key.

use std::fmt;
use std::str::FromStr;

/// Target architecture of a compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    X86,
    X64,
}

impl Arch {
    /// Both supported architectures, x86 first.
    pub const ALL: [Arch; 2] = [Arch::X86, Arch::X64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
        }
    }

    /// The complementary architecture.
    pub fn other(&self) -> Arch {
        match self {
            Arch::X86 => Arch::X64,
            Arch::X64 => Arch::X86,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86" => Ok(Arch::X86),
            "x64" => Ok(Arch::X64),
            _ => Err(format!("unknown architecture: {} (expected x86 or x64)", s)),
        }
    }
}

/// Static descriptor of a toolchain family.
///
/// `key` identifies the generation ("VS14.0", "SDK7.1"). Visual Studio
/// generations up to 14.0 are found through their tools-root environment
/// variable and fixed registry paths; generations with `vswhere` set are
/// discovered dynamically through the external enumeration tool. SDK
/// entries carry the VC runtime generation they ship, so a version-number
/// preference token can match them.
#[derive(Debug)]
pub struct CompilerPackage {
    /// Identifying key, unique across the catalog.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Architectures this generation can target.
    pub arches: &'static [Arch],
    /// Per-architecture switch passed to the setup script.
    pub switches: &'static [(Arch, &'static str)],
    /// Discovered via the external enumeration tool rather than fixed
    /// registry paths.
    pub vswhere: bool,
    /// VC runtime generation an SDK ships (None for VS entries, whose own
    /// version number identifies them).
    pub runtime_version: Option<&'static str>,
    /// Legacy tools-root environment variable ("VS140COMNTOOLS").
    pub tools_env: Option<&'static str>,
}

impl CompilerPackage {
    /// Whether this generation can target `arch`.
    pub fn supports(&self, arch: Arch) -> bool {
        self.arches.contains(&arch)
    }

    /// The catalog switch for `arch`, if any.
    pub fn switch_for(&self, arch: Arch) -> Option<&'static str> {
        self.switches
            .iter()
            .find(|(a, _)| *a == arch)
            .map(|(_, s)| *s)
    }

    /// The registry version component of a VS key ("VS14.0" -> "14.0").
    pub fn registry_version(&self) -> Option<&'static str> {
        self.key.strip_prefix("VS")
    }
}

/// The toolchain generations this tool knows about, newest first.
pub const CATALOG: &[CompilerPackage] = &[
    CompilerPackage {
        key: "VS17.0",
        name: "Visual Studio 2022",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "x64")],
        vswhere: true,
        runtime_version: None,
        tools_env: None,
    },
    CompilerPackage {
        key: "VS16.0",
        name: "Visual Studio 2019",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "x64")],
        vswhere: true,
        runtime_version: None,
        tools_env: None,
    },
    CompilerPackage {
        key: "VS15.0",
        name: "Visual Studio 2017",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "x64")],
        vswhere: true,
        runtime_version: None,
        tools_env: None,
    },
    CompilerPackage {
        key: "VS14.0",
        name: "Visual Studio 2015",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS140COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS12.0",
        name: "Visual Studio 2013",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS120COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS11.0",
        name: "Visual Studio 2012",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS110COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS10.0",
        name: "Visual Studio 2010",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS100COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS9.0",
        name: "Visual Studio 2008",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS90COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS8.0",
        name: "Visual Studio 2005",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "x86"), (Arch::X64, "amd64")],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS80COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS7.1",
        name: "Visual Studio .NET 2003",
        arches: &[Arch::X86],
        switches: &[],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS71COMNTOOLS"),
    },
    CompilerPackage {
        key: "VS7.0",
        name: "Visual Studio .NET 2002",
        arches: &[Arch::X86],
        switches: &[],
        vswhere: false,
        runtime_version: None,
        tools_env: Some("VS70COMNTOOLS"),
    },
    CompilerPackage {
        key: "SDK7.1",
        name: "Windows SDK 7.1",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "/x86"), (Arch::X64, "/x64")],
        vswhere: false,
        runtime_version: Some("10.0"),
        tools_env: None,
    },
    CompilerPackage {
        key: "SDK7.0",
        name: "Windows SDK 7.0",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "/x86"), (Arch::X64, "/x64")],
        vswhere: false,
        runtime_version: Some("9.0"),
        tools_env: None,
    },
    CompilerPackage {
        key: "SDK6.1",
        name: "Windows SDK 6.1",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "/x86"), (Arch::X64, "/x64")],
        vswhere: false,
        runtime_version: Some("9.0"),
        tools_env: None,
    },
    CompilerPackage {
        key: "SDK5.2",
        name: "Windows Server 2003 SP1 Platform SDK",
        arches: &Arch::ALL,
        switches: &[(Arch::X86, "/x86"), (Arch::X64, "/x64")],
        vswhere: false,
        runtime_version: None,
        tools_env: None,
    },
];

/// Stand-in descriptor for SDK versions found on the machine but absent
/// from the catalog. Recorded with an "assumed compatible" display name.
pub static GENERIC_SDK: CompilerPackage = CompilerPackage {
    key: "SDK",
    name: "Windows SDK",
    arches: &Arch::ALL,
    switches: &[(Arch::X86, "/x86"), (Arch::X64, "/x64")],
    vswhere: false,
    runtime_version: None,
    tools_env: None,
};

/// Look up a catalog entry by exact key.
pub fn find(key: &str) -> Option<&'static CompilerPackage> {
    CATALOG.iter().find(|p| p.key == key)
}

/// Look up the vswhere family entry for a major version ("17" -> VS17.0).
pub fn find_vswhere_family(major: &str) -> Option<&'static CompilerPackage> {
    let prefix = format!("VS{}.", major);
    CATALOG
        .iter()
        .find(|p| p.vswhere && p.key.starts_with(&prefix))
}
