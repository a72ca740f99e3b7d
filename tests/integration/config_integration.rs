//! Integration tests for layered configuration loading

use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;
use treesync::config::{ConfigLoader, SyncConfig};
use treesync::{LeafOrder, SymlinkPolicy};

/// Environment variables are process-global
static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvGuard {
    keys: Vec<&'static str>,
}

impl EnvGuard {
    fn set(vars: &[(&'static str, String)]) -> Self {
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        Self {
            keys: vars.iter().map(|(key, _)| *key).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            std::env::remove_var(key);
        }
    }
}

fn isolated_home(temp_dir: &TempDir) -> (&'static str, String) {
    (
        "XDG_CONFIG_HOME",
        temp_dir.path().join("xdg").to_string_lossy().into_owned(),
    )
}

#[cfg(target_os = "linux")]
#[test]
fn test_defaults_without_any_source() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[isolated_home(&temp_dir)]);

    let config = ConfigLoader::load(None).unwrap();
    assert_eq!(config, SyncConfig::default());
}

#[cfg(target_os = "linux")]
#[test]
fn test_global_file_then_explicit_file_then_environment() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();

    let global_dir = temp_dir.path().join("xdg").join("treesync");
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("config.toml"),
        "[snapshot]\nsymlinks = \"copy\"\nleaf_order = \"enumeration\"\n\n[watch]\ndebounce_ms = 50\n",
    )
    .unwrap();

    let explicit = temp_dir.path().join("explicit.toml");
    fs::write(&explicit, "[watch]\ndebounce_ms = 750\n").unwrap();

    let _env = EnvGuard::set(&[
        isolated_home(&temp_dir),
        ("TREESYNC__SNAPSHOT__SYMLINKS", "ignore".to_string()),
        ("TREESYNC__SNAPSHOT__MAX_SYMLINK_DEPTH", "8".to_string()),
    ]);

    let config = ConfigLoader::load(Some(&explicit)).unwrap();
    assert_eq!(config.snapshot.symlinks, SymlinkPolicy::Ignore);
    assert_eq!(config.snapshot.leaf_order, LeafOrder::Enumeration);
    assert_eq!(config.snapshot.max_symlink_depth, 8);
    assert_eq!(config.watch.debounce_ms, 750);
}

#[cfg(target_os = "linux")]
#[test]
fn test_invalid_environment_value_is_rejected() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();
    let _env = EnvGuard::set(&[
        isolated_home(&temp_dir),
        ("TREESYNC__WATCH__DEBOUNCE_MS", "0".to_string()),
    ]);

    assert!(ConfigLoader::load(None).is_err());
}

#[test]
fn test_rendered_config_loads_back() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = SyncConfig::default();
    config.snapshot.symlinks = SymlinkPolicy::CopyAsLeaf;
    config.watch.debounce_ms = 1_000;
    config.logging.format = "json".to_string();

    let path = temp_dir.path().join("rendered.toml");
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    assert_eq!(ConfigLoader::load_from_file(&path).unwrap(), config);
}
