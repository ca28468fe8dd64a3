//! Candidate enumeration from registry, environment, and vswhere sources.
//!
//! Three independent sources feed one shared mapping keyed by package key
//! (plus instance id in list mode). Keys are distinct by construction, so
//! no source overwrites another. A source that is absent on this machine
//! contributes zero entries; enumeration itself never fails.

pub mod legacy;
pub mod registry;
pub mod sdk;
pub mod types;
pub mod vswhere;

use std::collections::BTreeMap;

pub use registry::{Registry, SystemRegistry};
pub use types::FoundInstallation;

/// Discover every installation candidate on this machine.
///
/// `vswhere_output` supplies the raw enumeration-tool output (injected so
/// the scan is testable and the tool's absence is just `None`);
/// `instance_keys` selects list-installed keying.
pub fn enumerate_all<F>(
    registry: &dyn Registry,
    env_fn: F,
    vswhere_output: Option<&str>,
    instance_keys: bool,
) -> BTreeMap<String, FoundInstallation>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let mut found = BTreeMap::new();
    legacy::scan(registry, &env_fn, &mut found);
    sdk::scan(registry, &mut found);
    vswhere::scan(vswhere_output, instance_keys, &mut found);
    tracing::debug!("enumeration found {} candidate installation(s)", found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyRegistry;

    impl Registry for EmptyRegistry {
        fn value(&self, _key: &str, _name: &str) -> Option<String> {
            None
        }

        fn subkeys(&self, _key: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn all_sources_absent_yields_empty_mapping() {
        let found = enumerate_all(
            &EmptyRegistry,
            |_| Err(std::env::VarError::NotPresent),
            None,
            false,
        );
        assert!(found.is_empty());
    }
}
