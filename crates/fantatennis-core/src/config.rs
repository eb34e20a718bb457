// Configuration loading and parsing (config/fantatennis.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::standings::leaderboard::SortKey;
use crate::store::DEFAULT_CHUNK_SIZE;

/// Config file name inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "fantatennis.toml";

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
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league_name: String,
    /// Resolved SQLite path (never empty).
    pub db_path: String,
    pub import_chunk_size: usize,
    pub default_sort: SortKey,
    pub log_filter: String,
}

// ---------------------------------------------------------------------------
// fantatennis.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    league: LeagueSection,
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    import: ImportSection,
    #[serde(default)]
    leaderboard: LeaderboardSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct DatabaseSection {
    /// Empty means "use the platform data directory".
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ImportSection {
    chunk_size: usize,
}

impl Default for ImportSection {
    fn default() -> Self {
        ImportSection {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LeaderboardSection {
    default_sort: String,
}

impl Default for LeaderboardSection {
    fn default() -> Self {
        LeaderboardSection {
            default_sort: SortKey::default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: "fantatennis=info,warn".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/fantatennis.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text).map_err(|e| match e {
        ConfigError::ParseError { source, .. } => ConfigError::ParseError { path, source },
        other => other,
    })
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from(CONFIG_FILE),
        source: e,
    })?;

    let default_sort = file
        .leaderboard
        .default_sort
        .parse::<SortKey>()
        .map_err(|e| ConfigError::ValidationError {
            field: "leaderboard.default_sort".into(),
            message: e.to_string(),
        })?;

    let db_path = if file.database.path.trim().is_empty() {
        default_db_path()?
    } else {
        file.database.path
    };

    let config = Config {
        league_name: file.league.name,
        db_path,
        import_chunk_size: file.import.chunk_size,
        default_sort,
        log_filter: file.logging.filter,
    };

    validate(&config)?;
    Ok(config)
}

/// Seed `config/fantatennis.toml` from `defaults/` if it is missing.
/// Returns the written path, or `None` when a config was already in place.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let seed_error = |what: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    };
    let template = std::fs::read(&source).map_err(|e| seed_error("read", &source, e))?;
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| seed_error("create", dir, e))?;
    }
    std::fs::write(&target, template).map_err(|e| seed_error("write", &target, e))?;
    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding it from
/// `defaults/` on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
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

/// `<platform data dir>/fantatennis.db`, e.g. `~/.local/share/fantatennis/`.
fn default_db_path() -> Result<String, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "", "fantatennis").ok_or_else(|| {
        ConfigError::ValidationError {
            field: "database.path".into(),
            message: "empty, and no home directory to derive a default from".into(),
        }
    })?;
    Ok(dirs
        .data_dir()
        .join("fantatennis.db")
        .to_string_lossy()
        .into_owned())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league_name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.import_chunk_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "import.chunk_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}
