//! Planner settings – reads/writes `~/.quotient/config.toml`.

use quotient_planner::{LevelConfig, SequenceConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted planner settings stored in `~/.quotient/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Wall-clock budget of one `solve`, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Level growth and section search parameters.
    #[serde(default)]
    pub level: LevelConfig,

    /// Orchestrator parameters.
    #[serde(default)]
    pub sequence: SequenceConfig,
}

fn default_timeout_secs() -> f64 {
    10.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            level: LevelConfig::default(),
            sequence: SequenceConfig::default(),
        }
    }
}

/// Return the path to `~/.quotient/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".quotient").join("config.toml")
}

/// Settings from `path` (or `~/.quotient/config.toml`), defaults when the
/// file is absent, with environment overrides applied on top.
pub fn resolve(path: Option<&Path>) -> Result<Settings, String> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let mut settings = load_from(&path)?.unwrap_or_default();
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Load the settings from a specific path.  Returns `None` if the file does
/// not exist.
pub fn load_from(path: &Path) -> Result<Option<Settings>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let settings: Settings =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(settings))
}

/// Apply `QUOTIENT_*` environment variable overrides to `settings`.
///
/// Unparsable values are ignored.
///
/// | Variable | Settings field |
/// |---|---|
/// | `QUOTIENT_SEED` | `level.seed` |
/// | `QUOTIENT_TIMEOUT_SECS` | `timeout_secs` |
/// | `QUOTIENT_MAX_DEPTH` | `level.section.max_depth` |
/// | `QUOTIENT_STOP_LEVEL` | `sequence.stop_level` |
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(seed) = env_parse::<u64>("QUOTIENT_SEED") {
        settings.level.seed = Some(seed);
    }
    if let Some(secs) = env_parse::<f64>("QUOTIENT_TIMEOUT_SECS").filter(|s| *s >= 0.0) {
        settings.timeout_secs = secs;
    }
    if let Some(depth) = env_parse::<usize>("QUOTIENT_MAX_DEPTH") {
        settings.level.section.max_depth = depth;
    }
    if let Some(stop) = env_parse::<usize>("QUOTIENT_STOP_LEVEL") {
        settings.sequence.stop_level = Some(stop);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Save the settings to disk, creating `~/.quotient/` if necessary.
pub fn save(settings: &Settings) -> Result<(), String> {
    save_to(settings, &config_path())
}

pub(crate) fn save_to(settings: &Settings, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Settings::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "config directory must have 0o700 permissions");
    }

    #[test]
    fn roundtrip_custom_settings() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut settings = Settings::default();
        settings.timeout_secs = 2.5;
        settings.level.k_nearest = 6;
        settings.level.section.enable_tunneling = true;
        settings.sequence.refine_solved_levels = true;
        save_to(&settings, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.timeout_secs, 2.5);
        assert_eq!(loaded.level.k_nearest, 6);
        assert!(loaded.level.section.enable_tunneling);
        assert!(loaded.sequence.refine_solved_levels);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 1.0\n\n[level.section]\nmax_branching = 4\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.timeout_secs, 1.0);
        assert_eq!(loaded.level.section.max_branching, 4);
        assert_eq!(loaded.level.section.max_depth, 3);
        assert_eq!(loaded.level.k_nearest, 10);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        assert!(load_from(&path).unwrap_err().contains("parse"));
    }

    #[test]
    fn config_path_points_to_quotient_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".quotient"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // The overrides share process-wide variables, so they are exercised in a
    // single test.
    #[test]
    fn apply_env_overrides_sets_fields() {
        // SAFETY: no other test in this crate touches QUOTIENT_* variables.
        unsafe {
            std::env::set_var("QUOTIENT_SEED", "42");
            std::env::set_var("QUOTIENT_TIMEOUT_SECS", "0.5");
            std::env::set_var("QUOTIENT_MAX_DEPTH", "5");
            std::env::set_var("QUOTIENT_STOP_LEVEL", "not-a-level");
        }
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings);
        assert_eq!(settings.level.seed, Some(42));
        assert_eq!(settings.timeout_secs, 0.5);
        assert_eq!(settings.level.section.max_depth, 5);
        assert_eq!(settings.sequence.stop_level, None);

        unsafe { std::env::set_var("QUOTIENT_STOP_LEVEL", "1") };
        apply_env_overrides(&mut settings);
        assert_eq!(settings.sequence.stop_level, Some(1));

        unsafe {
            for name in ["QUOTIENT_SEED", "QUOTIENT_TIMEOUT_SECS", "QUOTIENT_MAX_DEPTH", "QUOTIENT_STOP_LEVEL"] {
                std::env::remove_var(name);
            }
        }
    }
}
