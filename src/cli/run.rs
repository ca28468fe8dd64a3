//! Command driver.
//!
//! Wires the engine to its production collaborators, handles the listing
//! modes, and renders the resolved toolchain. Returns the process exit
//! code: 0 on success (including list modes), 1 when nothing resolved,
//! 2 on malformed invocations (raised as configuration errors).

use std::path::Path;

use clap::CommandFactory;
use console::style;

use crate::catalog::{Arch, CATALOG};
use crate::cli::args::Cli;
use crate::engine::{self, Collaborators};
use crate::enumerate::{FoundInstallation, SystemRegistry};
use crate::envmatch::{self, EnvMatch};
use crate::error::{MsvcFindError, Result};
use crate::output::{self, OutputFormat, Selection};
use crate::probe;
use crate::resolve::{PreferenceList, DEFAULT_PREFERENCE};
use crate::validate::ToolRequirements;

/// Execute the parsed command line.
pub fn run(cli: &Cli) -> Result<i32> {
    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "msvcfind", &mut std::io::stdout());
        return Ok(0);
    }

    if cli.all {
        list_catalog();
        return Ok(0);
    }

    // Configuration errors are reported before anything is attempted.
    if cli.output == OutputFormat::Data && cli.arch.is_none() {
        return Err(MsvcFindError::ConflictingArguments {
            message: "--output data requires --arch".into(),
        });
    }

    let requirements = ToolRequirements {
        assembler: cli.with_assembler,
        manifest_tool: cli.with_mt,
    };

    let registry = SystemRegistry;
    let env = |key: &str| std::env::var(key);
    let vswhere = || crate::enumerate::vswhere::run_vswhere(|key| std::env::var(key));
    let prober = |found: &FoundInstallation, arch: Arch| {
        probe::probe_setup_script(&found.setup_script, found.switch_for(arch).as_deref())
    };
    let banner = |binary: &Path| envmatch::run_banner(binary);
    let collab = Collaborators {
        registry: &registry,
        env: &env,
        vswhere: &vswhere,
        prober: &prober,
        banner: &banner,
    };

    if cli.installed {
        list_installed(requirements, &collab);
        return Ok(0);
    }

    let preferences = if cli.preference.is_empty() {
        PreferenceList::parse(DEFAULT_PREFERENCE)?
    } else {
        PreferenceList::from_tokens(&cli.preference)?
    };

    let resolution = engine::resolve_toolchain(&preferences, cli.arch, requirements, &collab)?;
    tracing::info!("resolved {} ({})", resolution.name, resolution.winner);

    let selection = Selection {
        name: &resolution.name,
        version: &resolution.version,
        primary: resolution.primary.as_ref(),
        secondary: resolution.secondary.as_ref(),
        env_arch: resolution.env_arch,
        with_assembler: cli.with_assembler,
    };
    print!("{}", output::render(&selection, cli.output));

    Ok(0)
}

/// Print the static catalog.
fn list_catalog() {
    println!("{}", style("Available toolchain generations:").bold());
    for package in CATALOG {
        let arches: Vec<&str> = package.arches.iter().map(Arch::as_str).collect();
        println!(
            "  {:<10} {:<40} {}",
            style(package.key).cyan(),
            package.name,
            arches.join(", ")
        );
    }
}

/// Probe the machine and print every validated installation.
fn list_installed(requirements: ToolRequirements, collab: &Collaborators<'_>) {
    let (validated, env_compiler, env_match) = engine::installed(requirements, collab);

    if let Some(env) = &env_compiler {
        let identity = match &env_match {
            EnvMatch::Strong(key) => format!("identified as {}", key),
            EnvMatch::Weak(key) => format!("probably {}", key),
            EnvMatch::Ambiguous => "ambiguous identity".to_string(),
            EnvMatch::NotFound => "not among the installations below".to_string(),
        };
        println!(
            "{} {} ({}, {})",
            style("Environment compiler:").bold(),
            env.binary.display(),
            env.arch,
            identity
        );
    }

    if validated.is_empty() {
        println!("No installations found.");
        return;
    }

    println!("{}", style("Installed toolchains:").bold());
    for compiler in validated.values() {
        println!(
            "  {:<24} {:<44} {:<4} {}",
            style(&compiler.package_key).cyan(),
            compiler.name,
            compiler.arch,
            compiler.version
        );
    }
}
