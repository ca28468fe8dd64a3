//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use clap_complete::Shell;

use crate::catalog::Arch;
use crate::output::OutputFormat;

/// msvcfind - Microsoft C/C++ toolchain discovery and environment selection.
#[derive(Debug, Parser)]
#[command(name = "msvcfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// List every toolchain generation this tool can discover
    #[arg(long, conflicts_with_all = ["installed", "arch"])]
    pub all: bool,

    /// List only toolchains installed and validated on this machine
    #[arg(long, conflicts_with = "arch")]
    pub installed: bool,

    /// Pin the target architecture (x86 or x64)
    #[arg(short, long, value_name = "ARCH")]
    pub arch: Option<Arch>,

    /// Output format: shell, make, or data (data requires --arch)
    #[arg(short, long, default_value = "shell", value_name = "FORMAT")]
    pub output: OutputFormat,

    /// Increase diagnostic verbosity (repeat up to 4 times)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Require the assembler (ml.exe / ml64.exe) and emit MSVC_ML
    #[arg(long)]
    pub with_assembler: bool,

    /// Require the manifest tool (mt.exe)
    #[arg(long)]
    pub with_mt: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Ranked preference tokens; falls back to MSVC_PREFERENCE, then to
    /// the built-in newest-to-oldest ordering
    #[arg(value_name = "PREFERENCE", env = "MSVC_PREFERENCE", value_delimiter = ';')]
    pub preference: Vec<String>,
}
