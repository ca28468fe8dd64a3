//! Preference-list parsing and winner selection.
//!
//! A preference list ranks toolchains: the environment marker `@`, exact
//! package keys, bare version numbers, and major-version wildcards. The
//! resolver reconciles that ranking against the validated set and picks
//! exactly one winning package: "highest preference wins", with one
//! exception: when the marker is present and the active environment
//! compiler was positively identified, that identification trumps list
//! order, because a user inside a configured compiler prompt almost
//! always wants that exact compiler.

use regex::Regex;

use crate::catalog::{self, Arch};
use crate::error::{MsvcFindError, Result};
use crate::validate::{self, ValidatedSet};

/// The environment-compiler marker token.
pub const ENV_MARKER: &str = "@";

/// Built-in preference order, newest to oldest, environment first.
pub const DEFAULT_PREFERENCE: &str = "@;VS17.*;VS16.*;VS15.*;VS14.0;VS12.0;VS11.0;VS10.0;\
                                      VS9.0;VS8.0;VS7.1;VS7.0;SDK7.1;SDK7.0;SDK6.1;SDK5.2";

/// One parsed preference token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preference {
    /// The `@` marker: the already-active environment compiler.
    Environment,
    /// An exact package key ("VS14.0", "SDK7.1", "VS17.8").
    Package(String),
    /// A bare version number; matches the `VS`-aliased generation and any
    /// SDK sharing that runtime version.
    Version(String),
    /// `VS<major>.*`: every generation of that major version, most
    /// specific first. Payload is the major component.
    Wildcard(String),
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preference::Environment => f.write_str(ENV_MARKER),
            Preference::Package(key) => f.write_str(key),
            Preference::Version(version) => f.write_str(version),
            Preference::Wildcard(major) => write!(f, "VS{}.*", major),
        }
    }
}

/// A validated, duplicate-free preference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceList {
    tokens: Vec<Preference>,
}

impl PreferenceList {
    /// Parse a preference specification: tokens separated by `;` or
    /// whitespace. Rejects unknown and repeated tokens.
    pub fn parse(spec: &str) -> Result<Self> {
        Self::from_tokens(spec.split([';', ' ', '\t']).filter(|t| !t.is_empty()))
    }

    /// Build a list from pre-split tokens (CLI positionals). Each token
    /// may itself still carry `;`-separated entries.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<Preference> = Vec::new();
        for token in tokens {
            for token in token.as_ref().split(';').filter(|t| !t.is_empty()) {
                let preference = classify(token)?;
                if parsed.contains(&preference) {
                    return Err(MsvcFindError::InvalidPreference {
                        message: format!("duplicate token '{}'", token),
                    });
                }
                parsed.push(preference);
            }
        }
        if parsed.is_empty() {
            return Err(MsvcFindError::InvalidPreference {
                message: "preference list is empty".into(),
            });
        }
        Ok(Self { tokens: parsed })
    }

    pub fn tokens(&self) -> &[Preference] {
        &self.tokens
    }

    /// Whether the environment marker appears anywhere in the list.
    pub fn contains_environment(&self) -> bool {
        self.tokens.contains(&Preference::Environment)
    }
}

/// Classify one raw token, rejecting anything that is not the marker, a
/// known package key (including dynamically discovered `VS<major>.<minor>`
/// generations of a known family), a version number, or a wildcard over a
/// known family.
fn classify(token: &str) -> Result<Preference> {
    if token == ENV_MARKER {
        return Ok(Preference::Environment);
    }

    let wildcard = Regex::new(r"^VS(\d+)\.\*$").unwrap();
    if let Some(captures) = wildcard.captures(token) {
        let major = captures[1].to_string();
        let prefix = format!("VS{}.", major);
        if catalog::CATALOG.iter().any(|p| p.key.starts_with(prefix.as_str())) {
            return Ok(Preference::Wildcard(major));
        }
        return Err(MsvcFindError::InvalidPreference {
            message: format!("unknown generation in wildcard '{}'", token),
        });
    }

    if catalog::find(token).is_some() {
        return Ok(Preference::Package(token.to_string()));
    }

    // Exact minor versions of vswhere families ("VS17.8") are valid keys
    // even though only the family appears in the catalog.
    let vs_exact = Regex::new(r"^VS(\d+)\.\d+$").unwrap();
    if let Some(captures) = vs_exact.captures(token) {
        if catalog::find_vswhere_family(&captures[1]).is_some() {
            return Ok(Preference::Package(token.to_string()));
        }
        return Err(MsvcFindError::InvalidPreference {
            message: format!("unknown package '{}'", token),
        });
    }

    let numeric = Regex::new(r"^\d+\.\d+$").unwrap();
    if numeric.is_match(token) {
        return Ok(Preference::Version(token.to_string()));
    }

    Err(MsvcFindError::InvalidPreference {
        message: format!("unknown token '{}'", token),
    })
}

/// The (left, right) architecture pair a selection must satisfy: a pinned
/// architecture collapses both sides onto itself, otherwise x86/x64.
pub fn arch_pair(pin: Option<Arch>) -> (Arch, Arch) {
    match pin {
        Some(arch) => (arch, arch),
        None => (Arch::X86, Arch::X64),
    }
}

/// Select the winning package key.
///
/// `identified_env` is the environment compiler's package key when it was
/// positively identified (weak identifications are adopted by the caller
/// before this point). Returns `None` when nothing matches, an overall
/// resolution failure, not an error here.
pub fn resolve(
    preferences: &PreferenceList,
    validated: &ValidatedSet,
    identified_env: Option<&str>,
    left: Arch,
    right: Arch,
) -> Option<String> {
    if preferences.contains_environment() {
        if let Some(key) = identified_env {
            tracing::debug!("environment compiler '{}' wins by marker override", key);
            return Some(key.to_string());
        }
    }

    for token in preferences.tokens() {
        if *token == Preference::Environment {
            continue;
        }
        for key in expand(token, validated) {
            if validate::get(validated, &key, left).is_some()
                && validate::get(validated, &key, right).is_some()
            {
                tracing::debug!("preference '{}' selects '{}'", token, key);
                return Some(key);
            }
            tracing::debug!(
                "preference '{}': '{}' lacks a validated {}/{} pair",
                token,
                key,
                left,
                right
            );
        }
    }

    None
}

/// Expand a token into candidate package keys against the validated set,
/// in the order they should be tried.
fn expand(token: &Preference, validated: &ValidatedSet) -> Vec<String> {
    match token {
        Preference::Environment => Vec::new(),
        Preference::Package(key) => vec![key.clone()],
        Preference::Version(version) => {
            // The aliased fixed generation is tried before SDKs sharing
            // the runtime version.
            let mut keys = Vec::new();
            let alias = format!("VS{}", version);
            let all_keys = package_keys(validated);
            if all_keys.contains(&alias) {
                keys.push(alias);
            }
            for key in all_keys {
                let matches_runtime = key.starts_with("SDK")
                    && validated.values().any(|c| {
                        c.package_key == key && c.runtime_version.as_deref() == Some(version.as_str())
                    });
                if matches_runtime && !keys.contains(&key) {
                    keys.push(key);
                }
            }
            keys
        }
        Preference::Wildcard(major) => {
            let prefix = format!("VS{}.", major);
            let mut keys: Vec<String> = package_keys(validated)
                .into_iter()
                .filter(|key| key.starts_with(&prefix))
                .collect();
            // Most specific (highest full version) first.
            keys.sort_by(|a, b| version_of(b, &prefix).cmp(&version_of(a, &prefix)));
            keys
        }
    }
}

/// Distinct package keys of the validated set, lexicographic.
fn package_keys(validated: &ValidatedSet) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for candidate in validated.values() {
        if !keys.contains(&candidate.package_key) {
            keys.push(candidate.package_key.clone());
        }
    }
    keys
}

fn version_of(key: &str, prefix: &str) -> u64 {
    key.strip_prefix(prefix)
        .and_then(|minor| minor.parse().ok())
        .unwrap_or(0)
}
