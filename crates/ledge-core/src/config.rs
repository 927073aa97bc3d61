use std::path::Path;

use serde::de::DeserializeOwned;

/// Errors from reading, parsing, or validating a TOML config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Config records that can reject out-of-range values after parsing.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Require `value` to be finite and `>= 0`.
pub fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite value >= 0, got {value}"),
        });
    }
    Ok(())
}

/// Require `value` to be finite and within `[0, 1]`.
pub fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a value in [0, 1], got {value}"),
        });
    }
    Ok(())
}

/// Parse and validate a config record from TOML text.
pub fn parse_toml<T: DeserializeOwned + Validate>(content: &str) -> Result<T, ConfigError> {
    let cfg: T = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read, parse, and validate a config record from a TOML file.
pub fn read_toml<T: DeserializeOwned + Validate>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    parse_toml(&content)
}

/// Load a config record from the file named by `env_var`, else `default_path`.
/// Falls back to `T::default()` if the file is missing, unparseable, or invalid.
pub fn load_or_default<T>(env_var: &str, default_path: &str) -> T
where
    T: DeserializeOwned + Validate + Default,
{
    let path = std::env::var(env_var).unwrap_or_else(|_| default_path.to_string());
    match read_toml::<T>(Path::new(&path)) {
        Ok(cfg) => cfg,
        Err(ConfigError::Io(_)) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to load {path}: {e}, using defaults");
            T::default()
        },
    }
}
