use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;

/// Explicit configuration file; same as passing it positionally.
pub const ENV_CONFIG: &str = "SLIDEWAVE_CONFIG";
/// Overrides the per-user configuration directory.
pub const ENV_CONFIG_DIR: &str = "SLIDEWAVE_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "slidewave";
const APPLICATION: &str = "slidewave";
const CONFIG_FILE: &str = "slider.toml";

/// Where the slider configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Positional argument or `SLIDEWAVE_CONFIG`.
    Explicit(PathBuf),
    /// `<config_dir>/slider.toml`.
    UserDir(PathBuf),
    Builtin,
}

impl ConfigOrigin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigOrigin::Explicit(path) | ConfigOrigin::UserDir(path) => Some(path),
            ConfigOrigin::Builtin => None,
        }
    }
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Explicit(path) | ConfigOrigin::UserDir(path) => {
                write!(f, "{}", path.display())
            }
            ConfigOrigin::Builtin => f.write_str("built-in defaults"),
        }
    }
}

/// Picks the configuration source: explicit path, then the user config
/// directory, then the built-in deck.
pub fn locate_config(explicit: Option<PathBuf>) -> ConfigOrigin {
    if let Some(path) = explicit {
        return ConfigOrigin::Explicit(path);
    }
    match user_config_dir() {
        Some(dir) => locate_in(&dir),
        None => {
            tracing::warn!("failed to determine user config directory; using built-in deck");
            ConfigOrigin::Builtin
        }
    }
}

fn locate_in(dir: &Path) -> ConfigOrigin {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
        ConfigOrigin::UserDir(candidate)
    } else {
        tracing::debug!(path = %candidate.display(), "no user config found");
        ConfigOrigin::Builtin
    }
}

fn user_config_dir() -> Option<PathBuf> {
    if let Some(value) = env_override(ENV_CONFIG_DIR) {
        return Some(value);
    }
    ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

fn env_override(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let origin = locate_config(Some(PathBuf::from("deck.toml")));
        assert_eq!(origin, ConfigOrigin::Explicit(PathBuf::from("deck.toml")));
        assert_eq!(origin.path(), Some(Path::new("deck.toml")));
    }

    #[test]
    fn user_dir_config_is_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "version = 1").unwrap();
        assert_eq!(locate_in(dir.path()), ConfigOrigin::UserDir(path));
    }

    #[test]
    fn empty_user_dir_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let origin = locate_in(dir.path());
        assert_eq!(origin, ConfigOrigin::Builtin);
        assert_eq!(origin.path(), None);
        assert_eq!(origin.to_string(), "built-in defaults");
    }
}
