//! Setup-script probing.
//!
//! A toolchain's setup script (`vcvarsall.bat`, `SetEnv.cmd`, ...) mutates
//! PATH/INCLUDE/LIB when executed. The prober runs the script in a child
//! `cmd.exe`, then has the child echo the resulting variables after a
//! success marker. The incoming PATH is seeded with a unique nonexistent
//! sentinel directory, so the portion of the captured PATH before the
//! sentinel is exactly what the script prepended.
//!
//! Probe failures are never fatal: a script that exits nonzero, produces
//! no marker, or overruns the timeout simply yields `None` and the
//! candidate is excluded.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::env_scope::EnvScope;

/// Wall-clock bound for one setup-script invocation. Vendor scripts are
/// known to be slow (multi-second), and a machine may have many installed
/// generations; a hung script must not stall the whole enumeration.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Wall-clock bound for small helper tools (vswhere, compiler banner).
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(15);

/// Marker echoed by the child after the setup script succeeded. Output
/// without it is treated as a failed probe.
const PROBE_MARKER: &str = "!MSVCFIND-ENV!";

/// Variables cleared in the child so that a previously configured
/// toolchain does not leak into the probe of another. `ORIGINALPATH` is
/// the path-override variable honored by older SDK setup scripts.
const INTERFERING_VARS: &[&str] = &[
    "VSINSTALLDIR",
    "VCINSTALLDIR",
    "INCLUDE",
    "LIB",
    "ORIGINALPATH",
];

static SENTINEL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Environment harvested from one setup-script run for one architecture.
///
/// Directory lists are normalized: no doubled separators, exactly one
/// trailing separator (empty capture stays empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedEnvironment {
    /// Directories the setup script prepended to PATH.
    pub path: String,
    /// Full INCLUDE list after the script ran.
    pub include: String,
    /// Full LIB list after the script ran.
    pub lib: String,
    /// Build-tools version, backfilled from the Visual Studio version
    /// when the tools variable did not expand.
    pub tools_version: Option<String>,
    /// Windows SDK version selected by the script.
    pub sdk_version: Option<String>,
}

/// Run a setup script and harvest the environment it produces.
///
/// The process environment is mutated for the duration of the probe
/// (sentinel PATH prefix, interfering variables cleared) and restored on
/// every exit path; probes run sequentially and a leaked mutation would
/// corrupt the next one.
pub fn probe_setup_script(script: &Path, switch: Option<&str>) -> Option<ProbedEnvironment> {
    let sentinel = next_sentinel();

    let mut scope = EnvScope::clearing(INTERFERING_VARS);
    let parent_path = std::env::var("PATH").unwrap_or_default();
    scope.set("PATH", &format!("{};{}", sentinel, parent_path));

    let mut command = Command::new("cmd.exe");
    command.args(["/d", "/c", &probe_command_line(script, switch)]);

    let output = run_with_timeout(command, SETUP_TIMEOUT)?;
    parse_probe_output(&output, &sentinel)
}

/// Build the `cmd.exe /c` command line: call the script silently, then
/// echo the marker and the variables of interest.
fn probe_command_line(script: &Path, switch: Option<&str>) -> String {
    let invocation = match switch {
        Some(switch) => format!("call \"{}\" {}", script.display(), switch),
        None => format!("call \"{}\"", script.display()),
    };
    format!(
        "{} >nul 2>&1 && echo {} && echo PATH=%PATH% && echo INCLUDE=%INCLUDE% \
         && echo LIB=%LIB% && echo VCTOOLS=%VCToolsVersion% \
         && echo SDKVER=%WindowsSDKVersion% && echo VSVER=%VisualStudioVersion%",
        invocation, PROBE_MARKER
    )
}

/// A unique, guaranteed-nonexistent PATH entry for this probe.
fn next_sentinel() -> String {
    let n = SENTINEL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("C:\\__msvcfind_sentinel_{}_{}__", std::process::id(), n)
}

/// Parse the child's echoed output into a [`ProbedEnvironment`].
///
/// Everything before the marker line (the script's own noise, if any) is
/// discarded; a missing marker means the probe failed.
pub fn parse_probe_output(output: &str, sentinel: &str) -> Option<ProbedEnvironment> {
    let mut lines = output.lines().map(str::trim_end);
    lines.find(|line| *line == PROBE_MARKER)?;

    let mut path = None;
    let mut include = None;
    let mut lib = None;
    let mut vctools = None;
    let mut sdkver = None;
    let mut vsver = None;

    for line in lines {
        if let Some(value) = line.strip_prefix("PATH=") {
            path = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("INCLUDE=") {
            include = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("LIB=") {
            lib = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix("VCTOOLS=") {
            vctools = expanded(value);
        } else if let Some(value) = line.strip_prefix("SDKVER=") {
            sdkver = expanded(value).map(|v| v.trim_end_matches('\\').to_string());
        } else if let Some(value) = line.strip_prefix("VSVER=") {
            vsver = expanded(value);
        }
    }

    let added_path = cut_at_sentinel(&path?, sentinel);
    let include = include.filter(|v| !v.contains('%')).unwrap_or_default();
    let lib = lib.filter(|v| !v.contains('%')).unwrap_or_default();

    Some(ProbedEnvironment {
        path: normalize_dir_list(&added_path),
        include: normalize_dir_list(&include),
        lib: normalize_dir_list(&lib),
        tools_version: vctools.or(vsver),
        sdk_version: sdkver,
    })
}

/// An unset variable echoes its own `%NAME%` placeholder; treat that (and
/// empty values) as absent.
fn expanded(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.contains('%') {
        None
    } else {
        Some(value.to_string())
    }
}

/// Keep only the PATH entries before the sentinel: what the script added.
fn cut_at_sentinel(path: &str, sentinel: &str) -> String {
    path.split(';')
        .take_while(|entry| !entry.eq_ignore_ascii_case(sentinel))
        .collect::<Vec<_>>()
        .join(";")
}

/// Collapse duplicated separators and guarantee exactly one trailing
/// separator. An empty list stays empty. Duplicate directories are
/// preserved; order matters to the consumer.
pub fn normalize_dir_list(list: &str) -> String {
    let segments: Vec<&str> = super::files::split_list(list).collect();
    if segments.is_empty() {
        String::new()
    } else {
        let mut joined = segments.join(";");
        joined.push(';');
        joined
    }
}

/// Run a command to completion with a wall-clock bound, capturing stdout.
///
/// Returns `None` when the binary cannot be spawned (tool not installed)
/// or the timeout expires (the child is killed). Used for every one-shot
/// child invocation: setup probes, vswhere, the compiler banner.
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> Option<String> {
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::debug!("failed to spawn {:?}: {}", command.get_program(), err);
            return None;
        }
    };

    let mut stdout = child.stdout.take()?;
    let mut stderr = child.stderr.take()?;

    // Separate reader threads keep a chatty stream from blocking the
    // child; the channel doubles as the completion signal.
    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        let stdout_handle = thread::spawn(move || {
            let mut out = String::new();
            let _ = stdout.read_to_string(&mut out);
            out
        });
        let mut err = String::new();
        let _ = stderr.read_to_string(&mut err);
        let out = stdout_handle.join().unwrap_or_default();
        let _ = tx.send((out, err));
    });

    match rx.recv_timeout(timeout) {
        Ok((out, err)) => {
            let _ = reader.join();
            let _ = child.wait();
            // The compiler banner goes to stderr; callers that only care
            // about stdout see their stream first.
            if out.is_empty() {
                Some(err)
            } else {
                Some(out)
            }
        }
        Err(_) => {
            tracing::debug!("child {:?} exceeded {:?}, killing", command.get_program(), timeout);
            let _ = child.kill();
            let _ = child.wait();
            let _ = reader.join();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: &str = "C:\\__sentinel__";

    fn probe_output(body: &str) -> String {
        format!("Some script banner\n{}\n{}\n", PROBE_MARKER, body)
    }

    #[test]
    fn parse_cuts_path_at_sentinel() {
        let output = probe_output(
            "PATH=C:\\VC\\bin;C:\\SDK\\bin;C:\\__sentinel__;C:\\Windows\n\
             INCLUDE=C:\\VC\\include\n\
             LIB=C:\\VC\\lib\n\
             VCTOOLS=14.29.30133\n\
             SDKVER=10.0.19041.0\\\n\
             VSVER=16.0",
        );

        let probed = parse_probe_output(&output, SENTINEL).unwrap();
        assert_eq!(probed.path, "C:\\VC\\bin;C:\\SDK\\bin;");
        assert_eq!(probed.include, "C:\\VC\\include;");
        assert_eq!(probed.lib, "C:\\VC\\lib;");
        assert_eq!(probed.tools_version.as_deref(), Some("14.29.30133"));
        assert_eq!(probed.sdk_version.as_deref(), Some("10.0.19041.0"));
    }

    #[test]
    fn parse_without_marker_is_none() {
        let output = "PATH=C:\\VC\\bin;C:\\__sentinel__\nINCLUDE=x\nLIB=y\n";
        assert!(parse_probe_output(output, SENTINEL).is_none());
    }

    #[test]
    fn parse_backfills_tools_version_from_vs_version() {
        let output = probe_output(
            "PATH=C:\\VC\\bin;C:\\__sentinel__\n\
             INCLUDE=C:\\inc\n\
             LIB=C:\\lib\n\
             VCTOOLS=%VCToolsVersion%\n\
             SDKVER=%WindowsSDKVersion%\n\
             VSVER=14.0",
        );

        let probed = parse_probe_output(&output, SENTINEL).unwrap();
        assert_eq!(probed.tools_version.as_deref(), Some("14.0"));
        assert_eq!(probed.sdk_version, None);
    }

    #[test]
    fn parse_treats_unexpanded_include_as_empty() {
        let output = probe_output(
            "PATH=C:\\VC\\bin;C:\\__sentinel__\n\
             INCLUDE=%INCLUDE%\n\
             LIB=C:\\lib\n\
             VCTOOLS=\nSDKVER=\nVSVER=",
        );

        let probed = parse_probe_output(&output, SENTINEL).unwrap();
        assert_eq!(probed.include, "");
        assert_eq!(probed.lib, "C:\\lib;");
        assert_eq!(probed.tools_version, None);
    }

    #[test]
    fn sentinel_comparison_is_case_insensitive() {
        let output = probe_output(
            "PATH=C:\\VC\\bin;c:\\__SENTINEL__;C:\\Windows\n\
             INCLUDE=i\nLIB=l\nVCTOOLS=\nSDKVER=\nVSVER=",
        );

        let probed = parse_probe_output(&output, SENTINEL).unwrap();
        assert_eq!(probed.path, "C:\\VC\\bin;");
    }

    #[test]
    fn normalize_collapses_and_terminates() {
        assert_eq!(
            normalize_dir_list("C:\\a;;C:\\b;;;C:\\c"),
            "C:\\a;C:\\b;C:\\c;"
        );
        assert_eq!(normalize_dir_list("C:\\a;"), "C:\\a;");
        assert_eq!(normalize_dir_list(""), "");
        assert_eq!(normalize_dir_list(";;"), "");
    }

    #[test]
    fn normalize_preserves_duplicates_and_order() {
        assert_eq!(normalize_dir_list("C:\\a;C:\\b;C:\\a"), "C:\\a;C:\\b;C:\\a;");
    }

    #[test]
    fn normalized_lists_end_with_exactly_one_separator() {
        for input in ["C:\\a", "C:\\a;", "C:\\a;;", "C:\\a;C:\\b;;"] {
            let normalized = normalize_dir_list(input);
            assert!(normalized.ends_with(';'));
            assert!(!normalized.ends_with(";;"));
        }
    }

    #[test]
    fn sentinels_are_unique() {
        let a = next_sentinel();
        let b = next_sentinel();
        assert_ne!(a, b);
    }

    #[test]
    fn probe_command_line_quotes_script_and_appends_switch() {
        let line = probe_command_line(Path::new("C:\\Program Files\\VC\\vcvarsall.bat"), Some("amd64"));
        assert!(line.starts_with("call \"C:\\Program Files\\VC\\vcvarsall.bat\" amd64 >nul 2>&1"));
        assert!(line.contains(PROBE_MARKER));
        assert!(line.contains("echo PATH=%PATH%"));
    }

    #[test]
    fn probe_command_line_without_switch() {
        let line = probe_command_line(Path::new("C:\\VS\\vsvars32.bat"), None);
        assert!(line.starts_with("call \"C:\\VS\\vsvars32.bat\" >nul 2>&1"));
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_captures_stdout() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo captured"]);
        let output = run_with_timeout(command, Duration::from_secs(10)).unwrap();
        assert!(output.contains("captured"));
    }

    #[cfg(unix)]
    #[test]
    fn run_with_timeout_kills_hung_child() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 30"]);
        let started = std::time::Instant::now();
        assert!(run_with_timeout(command, Duration::from_millis(200)).is_none());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn run_with_timeout_missing_binary_is_none() {
        let command = Command::new("msvcfind-no-such-binary-12345");
        assert!(run_with_timeout(command, Duration::from_secs(1)).is_none());
    }
}
