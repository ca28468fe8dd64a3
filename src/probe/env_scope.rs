//! Scoped save/restore of process environment variables.
//!
//! Setup-script probes run sequentially against the same process
//! environment, so every variable mutated for isolation must be restored
//! to its prior value (including "was unset") before the next probe,
//! regardless of how the probe exits. [`EnvScope`] records the prior state
//! on acquisition and restores it on drop, so correctness does not depend
//! on call sites remembering to clean up.

/// A scoped environment mutation.
///
/// Variables named at construction are snapshotted and removed from the
/// process environment; further values can be set through [`EnvScope::set`].
/// Dropping the scope restores every touched variable.
#[derive(Debug)]
pub struct EnvScope {
    saved: Vec<(String, Option<String>)>,
}

impl EnvScope {
    /// Snapshot `vars` and remove them from the process environment.
    pub fn clearing(vars: &[&str]) -> Self {
        let mut scope = Self { saved: Vec::new() };
        for var in vars {
            scope.remember(var);
            std::env::remove_var(var);
        }
        scope
    }

    /// Set `var` to `value` within this scope.
    pub fn set(&mut self, var: &str, value: &str) {
        self.remember(var);
        std::env::set_var(var, value);
    }

    fn remember(&mut self, var: &str) {
        if !self.saved.iter().any(|(name, _)| name == var) {
            self.saved.push((var.to_string(), std::env::var(var).ok()));
        }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (var, prior) in self.saved.drain(..) {
            match prior {
                Some(value) => std::env::set_var(&var, value),
                None => std::env::remove_var(&var),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Serialize the environment-mutating tests; cargo runs tests on
    // multiple threads and the process environment is shared.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn clearing_removes_and_restores_set_variable() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MSVCFIND_TEST_SET", "before");

        {
            let _scope = EnvScope::clearing(&["MSVCFIND_TEST_SET"]);
            assert!(std::env::var("MSVCFIND_TEST_SET").is_err());
        }

        assert_eq!(
            std::env::var("MSVCFIND_TEST_SET").as_deref(),
            Ok("before")
        );
        std::env::remove_var("MSVCFIND_TEST_SET");
    }

    #[test]
    fn clearing_restores_unset_variable_to_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MSVCFIND_TEST_UNSET");

        {
            let mut scope = EnvScope::clearing(&["MSVCFIND_TEST_UNSET"]);
            scope.set("MSVCFIND_TEST_UNSET", "transient");
            assert_eq!(
                std::env::var("MSVCFIND_TEST_UNSET").as_deref(),
                Ok("transient")
            );
        }

        assert!(std::env::var("MSVCFIND_TEST_UNSET").is_err());
    }

    #[test]
    fn set_preserves_first_snapshot_across_overwrites() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MSVCFIND_TEST_OVERWRITE", "original");

        {
            let mut scope = EnvScope::clearing(&[]);
            scope.set("MSVCFIND_TEST_OVERWRITE", "first");
            scope.set("MSVCFIND_TEST_OVERWRITE", "second");
        }

        assert_eq!(
            std::env::var("MSVCFIND_TEST_OVERWRITE").as_deref(),
            Ok("original")
        );
        std::env::remove_var("MSVCFIND_TEST_OVERWRITE");
    }

    #[test]
    fn restores_on_panic_exit_path() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MSVCFIND_TEST_PANIC", "kept");

        let result = std::panic::catch_unwind(|| {
            let _scope = EnvScope::clearing(&["MSVCFIND_TEST_PANIC"]);
            panic!("probe failed");
        });
        assert!(result.is_err());

        assert_eq!(std::env::var("MSVCFIND_TEST_PANIC").as_deref(), Ok("kept"));
        std::env::remove_var("MSVCFIND_TEST_PANIC");
    }
}
