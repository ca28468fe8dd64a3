//! File probing and setup-script environment harvesting.

pub mod env_scope;
pub mod files;
pub mod setup;

pub use env_scope::EnvScope;
pub use files::{find_dir_containing, find_in_dirs, resolve_on_path, split_list};
pub use setup::{
    normalize_dir_list, probe_setup_script, run_with_timeout, ProbedEnvironment, SETUP_TIMEOUT,
    TOOL_TIMEOUT,
};
