//! Global settings loaded from TOML, following the same OnceLock pattern as
//! the readings table.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Read a settings file and install it via [`init_custom`].
pub fn init_custom_from_file(path: &Path) -> Result<(), SettingsError> {
    let content = std::fs::read_to_string(path)?;
    init_custom(content)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub search: SearchSettings,
    pub corpus: CorpusSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub max_alignment_cells: usize,
    pub max_query_letters: usize,
    pub max_alignment_steps: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusSettings {
    pub workers: usize,
    pub timeout_ms: u64,
}

impl CorpusSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    macro_rules! check_at_most {
        ($section:ident . $field:ident, $max:expr) => {
            if s.$section.$field > $max {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: format!("must be at most {}", $max),
                });
            }
        };
    }

    check_positive_usize!(search.max_alignment_cells);
    check_positive_usize!(search.max_query_letters);
    check_positive_usize!(search.max_alignment_steps);
    check_positive_usize!(corpus.workers);

    // Table indices are u32 and run scores (letters^2) must fit one.
    check_at_most!(search.max_alignment_cells, u32::MAX as usize);
    check_at_most!(search.max_query_letters, 4096);

    Ok(())
}
