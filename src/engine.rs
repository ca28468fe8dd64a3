//! The resolution pipeline: enumerate, validate, identify, select.
//!
//! Control flow is batch-style and strictly sequential. The engine only
//! needs a few capabilities from the outside world (enumerate raw
//! candidate sources, run an environment probe for a candidate, and test
//! file existence), so every external dependency enters through
//! [`Collaborators`] and the whole pipeline can run against fakes.

use std::path::Path;

use crate::catalog::Arch;
use crate::enumerate::{self, FoundInstallation, Registry};
use crate::envmatch::{self, EnvCompiler, EnvMatch};
use crate::error::{MsvcFindError, Result};
use crate::probe::ProbedEnvironment;
use crate::resolve::{self, PreferenceList};
use crate::validate::{self, ToolRequirements, ValidatedCompiler, ValidatedSet};

/// External capabilities of the engine.
///
/// `vswhere` yields the raw output of the enumeration tool (or `None`
/// when it is not installed); `prober` runs a candidate's setup script
/// for one architecture; `banner` captures a compiler binary's
/// identification banner.
pub struct Collaborators<'a> {
    pub registry: &'a dyn Registry,
    pub env: &'a dyn Fn(&str) -> std::result::Result<String, std::env::VarError>,
    pub vswhere: &'a dyn Fn() -> Option<String>,
    pub prober: &'a dyn Fn(&FoundInstallation, Arch) -> Option<ProbedEnvironment>,
    pub banner: &'a dyn Fn(&Path) -> Option<String>,
}

/// Outcome of a successful resolution, ready for the output formatter.
#[derive(Debug)]
pub struct Resolution {
    /// Winning package key.
    pub winner: String,
    pub name: String,
    pub version: String,
    /// Validated entry for the resolved (or pinned) architecture.
    pub primary: Option<ValidatedCompiler>,
    /// Validated entry for the complementary architecture when unpinned.
    pub secondary: Option<ValidatedCompiler>,
    /// Set when the winner is the active environment compiler; its
    /// architecture's lists need no change.
    pub env_arch: Option<Arch>,
}

/// Probe and validate every enumerated candidate for the needed
/// architectures. Failures exclude single (candidate, architecture)
/// pairs and nothing else.
pub fn validate_all(
    found: &std::collections::BTreeMap<String, FoundInstallation>,
    arches: &[Arch],
    requirements: ToolRequirements,
    prober: &dyn Fn(&FoundInstallation, Arch) -> Option<ProbedEnvironment>,
) -> ValidatedSet {
    let mut validated = ValidatedSet::new();

    for installation in found.values() {
        for &arch in arches {
            if !installation.supports(arch) {
                continue;
            }
            let Some(probed) = prober(installation, arch) else {
                tracing::debug!("{} ({}): probe produced no result", installation.key, arch);
                continue;
            };
            let Some(tools) = validate::validate(
                &probed.path,
                &probed.include,
                &probed.lib,
                &installation.name,
                arch,
                requirements,
            ) else {
                continue;
            };
            let compiler = ValidatedCompiler::assemble(installation, arch, probed, tools);
            validated.insert(compiler.key.clone(), compiler);
        }
    }

    tracing::debug!("{} validated (candidate, architecture) pair(s)", validated.len());
    validated
}

/// Run the full pipeline and select one winning installation.
pub fn resolve_toolchain(
    preferences: &PreferenceList,
    pin: Option<Arch>,
    requirements: ToolRequirements,
    collab: &Collaborators<'_>,
) -> Result<Resolution> {
    // The environment compiler is checked before anything else; it is a
    // candidate in its own right.
    let env_compiler = envmatch::detect(collab.env, collab.banner, requirements);

    let found = enumerate_candidates(collab, false);

    let arches: Vec<Arch> = match pin {
        Some(arch) => vec![arch],
        None => Arch::ALL.to_vec(),
    };
    let validated = validate_all(&found, &arches, requirements, collab.prober);

    let env_match = match &env_compiler {
        Some(env) => envmatch::identify(env, &validated),
        None => EnvMatch::NotFound,
    };
    if let EnvMatch::Weak(key) = &env_match {
        tracing::warn!(
            "environment compiler only weakly matches '{}' (INCLUDE/LIB differ); assuming it anyway",
            key
        );
    }

    let (left, right) = resolve::arch_pair(pin);
    let winner = resolve::resolve(preferences, &validated, env_match.identified(), left, right)
        .ok_or(MsvcFindError::NoCompilerFound)?;

    let primary = validate::get(&validated, &winner, left).cloned();
    let secondary = if pin.is_none() {
        validate::get(&validated, &winner, right).cloned()
    } else {
        None
    };

    let (name, version) = primary
        .as_ref()
        .or(secondary.as_ref())
        .map(|c| (c.name.clone(), c.version.clone()))
        .unwrap_or_else(|| (winner.clone(), String::new()));

    // Suppression only applies when the winner IS the active compiler;
    // switching to a different toolchain always needs the full lists.
    let env_arch = match (&env_compiler, env_match.identified()) {
        (Some(env), Some(identified)) if identified == winner => Some(env.arch),
        _ => None,
    };

    Ok(Resolution {
        winner,
        name,
        version,
        primary,
        secondary,
        env_arch,
    })
}

/// Everything installed on this machine, for the list-installed query:
/// validated entries (instance-keyed) plus the environment compiler and
/// its identification.
pub fn installed(
    requirements: ToolRequirements,
    collab: &Collaborators<'_>,
) -> (ValidatedSet, Option<EnvCompiler>, EnvMatch) {
    let env_compiler = envmatch::detect(collab.env, collab.banner, requirements);
    let found = enumerate_candidates(collab, true);
    let validated = validate_all(&found, &Arch::ALL, requirements, collab.prober);

    let env_match = match &env_compiler {
        Some(env) => envmatch::identify(env, &validated),
        None => EnvMatch::NotFound,
    };

    (validated, env_compiler, env_match)
}

fn enumerate_candidates(
    collab: &Collaborators<'_>,
    instance_keys: bool,
) -> std::collections::BTreeMap<String, FoundInstallation> {
    let vswhere_output = (collab.vswhere)();
    enumerate::enumerate_all(
        collab.registry,
        collab.env,
        vswhere_output.as_deref(),
        instance_keys,
    )
}
