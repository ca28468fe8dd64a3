//! Environment-compiler detection and identification.
//!
//! A user invoking this tool from an already-configured compiler prompt
//! has a compiler on the live PATH. Detection validates that compiler as
//! a candidate in its own right; identification then works out which
//! validated installation it actually is, with explicit confidence:
//! strong when binary, INCLUDE, and LIB all corroborate, weak when only
//! the binary path matches, ambiguous when more than one candidate is
//! equally plausible.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::catalog::Arch;
use crate::probe::{files, run_with_timeout, TOOL_TIMEOUT};
use crate::validate::{self, ToolRequirements, ValidatedSet};

/// The compiler binary probed for on the live PATH.
const COMPILER_BINARY: &str = "cl.exe";

/// A compiler found active in the calling process's environment.
#[derive(Debug, Clone)]
pub struct EnvCompiler {
    /// Full path of the compiler binary as resolved from the live PATH.
    pub binary: PathBuf,
    /// Architecture extracted from the identification banner.
    pub arch: Arch,
    /// Live INCLUDE value.
    pub include: String,
    /// Live LIB value.
    pub lib: String,
    /// Resolved assembler, when required.
    pub assembler: Option<String>,
}

/// Which validated candidate the environment compiler corresponds to.
///
/// `Ambiguous` is treated as "none" during resolution but logged
/// distinctly; it is a different fact than `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMatch {
    NotFound,
    Ambiguous,
    Weak(String),
    Strong(String),
}

impl EnvMatch {
    /// The positively identified package key, if any.
    ///
    /// A weak identification is adopted as the best available one; the
    /// caller warns about it.
    pub fn identified(&self) -> Option<&str> {
        match self {
            EnvMatch::Strong(key) | EnvMatch::Weak(key) => Some(key),
            EnvMatch::NotFound | EnvMatch::Ambiguous => None,
        }
    }
}

/// Detect a compiler already active in the environment.
///
/// The banner function runs the binary and returns its identification
/// banner (injected for tests; production uses [`run_banner`]). Every
/// failure path discards the environment compiler without error: an
/// unrecognized banner warns, missing INCLUDE/LIB or failed validation
/// just logs.
pub fn detect<F, B>(env_fn: F, banner_fn: B, requirements: ToolRequirements) -> Option<EnvCompiler>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    B: Fn(&Path) -> Option<String>,
{
    let live_path = env_fn("PATH").ok()?;
    let binary = files::resolve_on_path(COMPILER_BINARY, &live_path)?;
    tracing::debug!("environment compiler candidate at {:?}", binary);

    let banner = banner_fn(&binary)?;
    let Some(arch) = arch_from_banner(&banner) else {
        tracing::warn!(
            "compiler at {:?} has an unrecognized target architecture, ignoring it",
            binary
        );
        return None;
    };

    let include = case_variant(&env_fn, &["INCLUDE", "Include", "include"])?;
    let lib = case_variant(&env_fn, &["LIB", "Lib", "lib"])?;

    let tools = validate::validate(
        &live_path,
        &include,
        &lib,
        "environment compiler",
        arch,
        requirements,
    )?;

    Some(EnvCompiler {
        binary,
        arch,
        include,
        lib,
        assembler: tools.assembler,
    })
}

/// Run the compiler binary and capture its identification banner.
pub fn run_banner(binary: &Path) -> Option<String> {
    let command = Command::new(binary);
    run_with_timeout(command, TOOL_TIMEOUT)
}

/// Extract the target architecture from a compiler banner. Substring
/// matches are case-sensitive; older banners say "80x86" for x86.
fn arch_from_banner(banner: &str) -> Option<Arch> {
    if banner.contains("x64") {
        Some(Arch::X64)
    } else if banner.contains("x86") {
        Some(Arch::X86)
    } else {
        None
    }
}

/// First set value among case-variant names of one variable.
fn case_variant<F>(env_fn: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    names.iter().find_map(|name| env_fn(name).ok())
}

/// Identify which validated candidate the environment compiler is.
///
/// Candidates whose compiler binary normalizes to the same path as the
/// environment compiler's are compared on INCLUDE/LIB: both fully
/// contained in the live values makes a strong match, otherwise weak.
/// Multiple equally strong (or, absent any strong, equally weak) matches
/// collapse to [`EnvMatch::Ambiguous`]. Iteration over the validated set
/// is lexicographic, so the collapse is reproducible.
pub fn identify(env: &EnvCompiler, validated: &ValidatedSet) -> EnvMatch {
    let env_binary = normalize_binary_path(&env.binary);
    let mut strong = Vec::new();
    let mut weak = Vec::new();

    for candidate in validated.values() {
        let Some(dir) = files::find_dir_containing(&candidate.path, COMPILER_BINARY) else {
            continue;
        };
        let candidate_binary = normalize_binary_path(&dir.join(COMPILER_BINARY));
        if candidate_binary != env_binary {
            continue;
        }

        if contains_all(&candidate.include, &env.include) && contains_all(&candidate.lib, &env.lib)
        {
            strong.push(candidate.package_key.clone());
        } else {
            weak.push(candidate.package_key.clone());
        }
    }

    match (strong.len(), weak.len()) {
        (1, _) => EnvMatch::Strong(strong.remove(0)),
        (0, 1) => EnvMatch::Weak(weak.remove(0)),
        (0, 0) => EnvMatch::NotFound,
        _ => {
            tracing::debug!(
                "environment compiler matches {} candidate(s) equally, treating as ambiguous",
                if strong.is_empty() { weak.len() } else { strong.len() }
            );
            EnvMatch::Ambiguous
        }
    }
}

/// Normalize a compiler binary path for comparison: lowercase, uniform
/// separators, architecture subdirectory segments stripped (the x86 and
/// x64 drivers of one installation live in sibling arch directories).
fn normalize_binary_path(path: &Path) -> String {
    const ARCH_SEGMENTS: &[&str] = &[
        "x86",
        "x64",
        "amd64",
        "x86_amd64",
        "amd64_x86",
        "hostx86",
        "hostx64",
    ];

    path.display()
        .to_string()
        .to_lowercase()
        .replace('/', "\\")
        .split('\\')
        .filter(|segment| !segment.is_empty() && !ARCH_SEGMENTS.contains(segment))
        .collect::<Vec<_>>()
        .join("\\")
}

/// Whether every directory of `wanted` appears in `live` (compared
/// case-insensitively, ignoring trailing separators).
fn contains_all(wanted: &str, live: &str) -> bool {
    let live_dirs: Vec<String> = files::split_list(live).map(normalize_dir).collect();
    files::split_list(wanted).all(|dir| live_dirs.contains(&normalize_dir(dir)))
}

fn normalize_dir(dir: &str) -> String {
    dir.to_lowercase()
        .replace('/', "\\")
        .trim_end_matches('\\')
        .to_string()
}
