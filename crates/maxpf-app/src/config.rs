// Configuration loading and parsing (engine.toml, leagues.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub data_dir: PathBuf,
    /// Concurrent weekly evaluations. Zero means one per available core.
    pub workers: usize,
    pub log_filter: String,
    pub leagues: Vec<LeagueConfig>,
}

impl Config {
    /// Worker count with zero resolved to the available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    database: DatabaseSection,
    data: DataSection,
    #[serde(default)]
    runtime: RuntimeSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    dir: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RuntimeSection {
    #[serde(default)]
    workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    #[serde(default = "default_log_filter")]
    filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "maxpf=info,warn".to_string()
}

// ---------------------------------------------------------------------------
// leagues.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct LeaguesFile {
    #[serde(default)]
    leagues: Vec<LeagueConfig>,
}

/// A league the engine keeps derived stats for.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub seasons: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/engine.toml` and
/// `config/leagues.toml`, relative to `base_dir`. Relative data directories
/// resolve against `base_dir` too.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- engine.toml (required) ---
    let engine_path = config_dir.join(ENGINE_FILE);
    let engine_text = read_file(&engine_path)?;
    let engine: EngineFile = toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
        path: engine_path.clone(),
        source: e,
    })?;

    // --- leagues.toml (required) ---
    let leagues_path = config_dir.join(LEAGUES_FILE);
    let leagues_text = read_file(&leagues_path)?;
    let leagues: LeaguesFile =
        toml::from_str(&leagues_text).map_err(|e| ConfigError::ParseError {
            path: leagues_path.clone(),
            source: e,
        })?;

    let data_dir = PathBuf::from(&engine.data.dir);
    let data_dir = if data_dir.is_absolute() {
        data_dir
    } else {
        base_dir.join(data_dir)
    };

    let config = Config {
        db_path: engine.database.path,
        data_dir,
        workers: engine.runtime.workers,
        log_filter: engine.logging.filter,
        leagues: leagues.leagues,
    };

    validate(&config)?;

    Ok(config)
}

/// Files under `config/` that `defaults/` can seed.
const CONFIG_FILES: &[&str] = &[ENGINE_FILE, LEAGUES_FILE];
const ENGINE_FILE: &str = "engine.toml";
const LEAGUES_FILE: &str = "leagues.toml";

/// Copy `engine.toml` and `leagues.toml` from `defaults/` into `config/`
/// when they are missing there. Existing files are left alone. Returns the
/// files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {}: {e}", source.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// into `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    let mut seen = HashSet::new();
    for league in &config.leagues {
        if league.id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "leagues.id".into(),
                message: "must not be empty".into(),
            });
        }
        if !seen.insert(league.id.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "leagues.id".into(),
                message: format!("duplicate league id {}", league.id),
            });
        }
        if league.seasons.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("leagues.{}.seasons", league.id),
                message: "must list at least one season".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn crate_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Fresh temp dir with a config/ directory holding the given files.
    fn setup(name: &str, engine: &str, leagues: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("engine.toml"), engine).unwrap();
        fs::write(config_dir.join("leagues.toml"), leagues).unwrap();
        tmp
    }

    const ENGINE: &str = r#"
[database]
path = "maxpf.db"

[data]
dir = "data"
"#;

    #[test]
    fn load_default_config_files() {
        let tmp = std::env::temp_dir().join("maxpf_config_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        for name in ["engine.toml", "leagues.toml"] {
            fs::copy(
                crate_root().join("defaults").join(name),
                tmp.join("defaults").join(name),
            )
            .unwrap();
        }

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 2);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.db_path, "maxpf.db");
        assert_eq!(config.data_dir, tmp.join("data/leagues"));
        assert_eq!(config.workers, 0);
        assert_eq!(config.log_filter, "maxpf=info,warn");
        assert!(config.effective_workers() >= 1);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_take_defaults() {
        let tmp = setup("maxpf_config_optional", ENGINE, "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.workers, 0);
        assert_eq!(config.log_filter, "maxpf=info,warn");
        assert!(config.leagues.is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reads_leagues_and_runtime() {
        let engine = format!("{ENGINE}\n[runtime]\nworkers = 3\n\n[logging]\nfilter = \"maxpf=debug\"\n");
        let leagues = r#"
[[leagues]]
id = "784512"
name = "Dynasty"
seasons = [2022, 2023]
"#;
        let tmp = setup("maxpf_config_leagues", &engine, leagues);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.effective_workers(), 3);
        assert_eq!(config.log_filter, "maxpf=debug");
        assert_eq!(config.leagues.len(), 1);
        assert_eq!(config.leagues[0].name, "Dynasty");
        assert_eq!(config.leagues[0].seasons, vec![2022, 2023]);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_db_path() {
        let engine = "[database]\npath = \"  \"\n\n[data]\ndir = \"data\"\n";
        let tmp = setup("maxpf_config_empty_db", engine, "");
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "database.path"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_duplicate_league_ids() {
        let leagues = r#"
[[leagues]]
id = "1"
seasons = [2023]

[[leagues]]
id = "1"
seasons = [2024]
"#;
        let tmp = setup("maxpf_config_dup_league", ENGINE, leagues);
        let err = load_config_from(&tmp).unwrap_err();
        assert!(err.to_string().contains("duplicate league id 1"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_league_without_seasons() {
        let leagues = "[[leagues]]\nid = \"9\"\nseasons = []\n";
        let tmp = setup("maxpf_config_no_seasons", ENGINE, leagues);
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "leagues.9.seasons"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_engine_toml() {
        let tmp = setup("maxpf_config_missing_engine", ENGINE, "");
        fs::remove_file(tmp.join("config/engine.toml")).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = setup("maxpf_config_invalid", "[database\npath = ", "");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_only_missing_config_files() {
        let tmp = std::env::temp_dir().join("maxpf_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults/engine.toml"), "default").unwrap();
        fs::write(tmp.join("defaults/leagues.toml"), "default").unwrap();
        fs::write(tmp.join("defaults/notes.txt"), "x").unwrap();
        fs::write(tmp.join("config/engine.toml"), "custom").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/leagues.toml")]);
        assert_eq!(fs::read_to_string(tmp.join("config/engine.toml")).unwrap(), "custom");
        assert!(!tmp.join("config/notes.txt").exists());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_defaults_keeps_config() {
        let tmp = std::env::temp_dir().join("maxpf_config_no_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("maxpf_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
