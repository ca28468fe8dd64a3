//! Wire-format rendering of a resolved toolchain.
//!
//! Three formats share one contract: a name variable that is always set,
//! PATH/INCLUDE/LIB values for the resolved architecture, a secondary
//! `MSVC64_`-prefixed block for the complementary architecture when no
//! architecture was pinned, and an assembler variable on request. A
//! directory list is emitted empty when its architecture equals the
//! active environment compiler's: the caller has nothing to change for
//! that architecture.

use std::str::FromStr;

use crate::catalog::Arch;
use crate::validate::ValidatedCompiler;

/// Output wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Interactive-shell assignments (`MSVC_PATH='...'`).
    #[default]
    Shell,
    /// Build-file macro assignments (`MSVC_PATH=...` with make escaping).
    Make,
    /// Machine-parseable tagged lines for package-manager integration.
    Data,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shell" => Ok(Self::Shell),
            "make" => Ok(Self::Make),
            "data" => Ok(Self::Data),
            _ => Err(format!("unknown output format: {} (expected shell, make, or data)", s)),
        }
    }
}

/// The winning toolchain as handed to the formatter.
#[derive(Debug)]
pub struct Selection<'a> {
    /// Display name; emitted even when every list is suppressed.
    pub name: &'a str,
    pub version: &'a str,
    /// Entry for the resolved (or pinned) architecture.
    pub primary: Option<&'a ValidatedCompiler>,
    /// Entry for the complementary architecture when unpinned.
    pub secondary: Option<&'a ValidatedCompiler>,
    /// Architecture of the active environment compiler, if any; its
    /// lists are suppressed.
    pub env_arch: Option<Arch>,
    /// Emit the assembler variable.
    pub with_assembler: bool,
}

impl Selection<'_> {
    fn suppressed(&self, compiler: &ValidatedCompiler) -> bool {
        self.env_arch == Some(compiler.arch)
    }
}

/// Render the selection in the requested format.
pub fn render(selection: &Selection<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Shell => render_assignments(selection, &shell_escape),
        OutputFormat::Make => render_assignments(selection, &make_escape),
        OutputFormat::Data => render_data(selection),
    }
}

/// Shell and make modes differ only in value escaping.
fn render_assignments(selection: &Selection<'_>, escape: &dyn Fn(&str) -> String) -> String {
    let mut out = String::new();
    out.push_str(&format!("MSVC_NAME={}\n", escape(selection.name)));

    for (prefix, compiler) in [("MSVC", selection.primary), ("MSVC64", selection.secondary)] {
        let Some(compiler) = compiler else {
            continue;
        };
        let (path, include, lib) = if selection.suppressed(compiler) {
            ("", "", "")
        } else {
            (
                compiler.path.as_str(),
                compiler.include.as_str(),
                compiler.lib.as_str(),
            )
        };
        out.push_str(&format!("{}_PATH={}\n", prefix, escape(path)));
        out.push_str(&format!("{}_INC={}\n", prefix, escape(include)));
        out.push_str(&format!("{}_LIB={}\n", prefix, escape(lib)));
    }

    if selection.with_assembler {
        let assembler = selection
            .primary
            .and_then(|c| c.assembler.as_deref())
            .unwrap_or_default();
        out.push_str(&format!("MSVC_ML={}\n", escape(assembler)));
    }

    out
}

/// The machine-parseable stream consumed by the package-cache
/// collaborator: name and version, the tagged setup invocation, then one
/// tagged line per directory entry.
fn render_data(selection: &Selection<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", selection.name, selection.version));

    let Some(compiler) = selection.primary else {
        return out;
    };

    let script = compiler.setup_script.display().to_string();
    let script = if script.contains(char::is_whitespace) {
        format!("\"{}\"", script)
    } else {
        script
    };
    match &compiler.setup_switch {
        Some(switch) => out.push_str(&format!("run:{} {}\n", script, switch)),
        None => out.push_str(&format!("run:{}\n", script)),
    }

    if !selection.suppressed(compiler) {
        for (tag, list) in [
            ("bin", &compiler.path),
            ("inc", &compiler.include),
            ("lib", &compiler.lib),
        ] {
            for dir in crate::probe::split_list(list) {
                out.push_str(&format!("{}:{}\n", tag, dir));
            }
        }
    }

    if selection.with_assembler {
        if let Some(assembler) = &compiler.assembler {
            out.push_str(&format!("asm:{}\n", assembler));
        }
    }

    out
}

/// Single-quote a value for the shell, doubling embedded single quotes.
fn shell_escape(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape `#` and `$` for a make fragment.
fn make_escape(value: &str) -> String {
    value.replace('$', "$$").replace('#', "\\#")
}
