use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for payload key validation (compiled once at first use)
static PAYLOAD_FIELD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").unwrap());

/// Name converters the normalizer can be built with.
pub const NAME_CONVERTERS: &[&str] = &["none", "snake_case", "serialized_name"];

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub normalizer: Option<NormalizerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizerSection {
    #[serde(default)]
    pub serialize_payload_fields: Option<Vec<String>>,
    #[serde(default)]
    pub name_converter: Option<String>,
    #[serde(default)]
    pub serialized_names: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub target_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try each enabled format in turn
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub normalizer: NormalizerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizerConfig {
    /// Constraint payload keys that may be forwarded to clients, in output order.
    pub serialize_payload_fields: Vec<String>,
    pub name_converter: String,
    pub serialized_names: BTreeMap<String, String>,
    pub target_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig {
                serialize_payload_fields: Vec::new(),
                name_converter: "none".to_string(),
                serialized_names: BTreeMap::new(),
                target_type: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

#[inline]
fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
    ($target:expr, $source:expr, wrap) => {
        if let Some(v) = $source {
            $target = Some(v);
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        if let Some(n) = raw.normalizer {
            apply_opt!(cfg.normalizer.serialize_payload_fields, n.serialize_payload_fields);
            apply_opt!(cfg.normalizer.name_converter, n.name_converter);
            apply_opt!(cfg.normalizer.serialized_names, n.serialized_names);
            apply_opt!(cfg.normalizer.target_type, n.target_type, wrap);
        }
        if let Some(logging) = raw.logging {
            apply_opt!(cfg.logging.level, logging.level);
            apply_opt!(cfg.logging.json, logging.json);
        }
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Normalizer
    if let Some(v) = env_str("PROBLEMKIT_PAYLOAD_FIELDS") {
        cfg.normalizer.serialize_payload_fields = split_csv(&v);
    }
    if let Some(v) = env_str("PROBLEMKIT_NAME_CONVERTER") {
        cfg.normalizer.name_converter = v;
    }
    if let Some(v) = env_str("PROBLEMKIT_TARGET_TYPE") {
        cfg.normalizer.target_type = Some(v);
    }

    // Logging
    if let Some(v) = env_str("PROBLEMKIT_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("PROBLEMKIT_LOG_JSON")? {
        cfg.logging.json = v;
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    let n = &cfg.normalizer;
    if !NAME_CONVERTERS.contains(&n.name_converter.as_str()) {
        return Err(ConfigError::Validation(format!(
            "unknown name converter: {}",
            n.name_converter
        )));
    }
    if n.name_converter == "serialized_name" && n.serialized_names.is_empty() {
        return Err(ConfigError::Validation(
            "normalizer.serialized_names must be set for the serialized_name converter".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for field in &n.serialize_payload_fields {
        if !PAYLOAD_FIELD_REGEX.is_match(field) {
            return Err(ConfigError::Validation(format!(
                "invalid payload field: {:?}",
                field
            )));
        }
        if !seen.insert(field.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate payload field: {}",
                field
            )));
        }
    }

    if cfg.logging.level.trim().is_empty() {
        return Err(ConfigError::Validation(
            "logging.level must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // load_config reads process-wide env vars
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "PROBLEMKIT_PAYLOAD_FIELDS",
        "PROBLEMKIT_NAME_CONVERTER",
        "PROBLEMKIT_TARGET_TYPE",
        "PROBLEMKIT_LOG_LEVEL",
        "PROBLEMKIT_LOG_JSON",
    ];

    fn clear_env() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    fn write_config(suffix: &str, body: &str) -> NamedTempFile {
        let f = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("tmpfile");
        std::fs::write(f.path(), body).unwrap();
        f
    }

    #[test]
    fn parse_toml() {
        let f = write_config(
            ".toml",
            r#"
[normalizer]
serialize_payload_fields = ["severity", "hint"]
name_converter = "snake_case"

[logging]
level = "debug"
"#,
        );
        let raw = load_raw_from_file(f.path()).expect("load");
        let n = raw.normalizer.unwrap();
        assert_eq!(
            n.serialize_payload_fields.unwrap(),
            vec!["severity".to_string(), "hint".to_string()]
        );
        assert_eq!(n.name_converter.as_deref(), Some("snake_case"));
        assert_eq!(raw.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn parse_yaml() {
        let f = write_config(
            ".yaml",
            r#"
normalizer:
  name_converter: serialized_name
  target_type: Book
  serialized_names:
    publishedAt: published_on
"#,
        );
        let raw = load_raw_from_file(f.path()).expect("load");
        let n = raw.normalizer.unwrap();
        assert_eq!(n.target_type.as_deref(), Some("Book"));
        assert_eq!(
            n.serialized_names.unwrap().get("publishedAt").map(String::as_str),
            Some("published_on")
        );
        assert!(raw.logging.is_none());
    }

    #[test]
    fn parse_without_extension() {
        let f = NamedTempFile::new().expect("tmpfile");
        std::fs::write(
            f.path(),
            r#"{"normalizer": {"serialize_payload_fields": ["severity"]}}"#,
        )
        .unwrap();
        let raw = load_raw_from_file(f.path()).expect("load");
        assert_eq!(
            raw.normalizer.unwrap().serialize_payload_fields.unwrap(),
            vec!["severity".to_string()]
        );
    }

    #[test]
    fn file_values_over_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let f = write_config(
            ".json",
            r#"{"normalizer": {"serialize_payload_fields": ["severity"], "name_converter": "snake_case"}, "logging": {"json": true}}"#,
        );
        let cfg = load_config(Some(f.path())).expect("load");
        assert_eq!(cfg.normalizer.serialize_payload_fields, vec!["severity".to_string()]);
        assert_eq!(cfg.normalizer.name_converter, "snake_case");
        assert!(cfg.logging.json);
        assert_eq!(cfg.logging.level, "info");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let f = write_config(
            ".toml",
            r#"
[normalizer]
serialize_payload_fields = ["severity"]
"#,
        );

        std::env::set_var("PROBLEMKIT_PAYLOAD_FIELDS", "level, hint, ,");
        std::env::set_var("PROBLEMKIT_NAME_CONVERTER", "snake_case");
        std::env::set_var("PROBLEMKIT_LOG_LEVEL", "trace");
        std::env::set_var("PROBLEMKIT_LOG_JSON", "yes");

        let cfg = load_config(Some(f.path())).expect("load config");
        assert_eq!(
            cfg.normalizer.serialize_payload_fields,
            vec!["level".to_string(), "hint".to_string()]
        );
        assert_eq!(cfg.normalizer.name_converter, "snake_case");
        assert_eq!(cfg.logging.level, "trace");
        assert!(cfg.logging.json);

        std::env::set_var("PROBLEMKIT_LOG_JSON", "maybe");
        assert!(matches!(
            load_config::<&Path>(None),
            Err(ConfigError::Parse(_))
        ));

        clear_env();
    }

    #[test]
    fn validation_rules() {
        assert!(validate_config(&Config::default()).is_ok());

        let mut cfg = Config::default();
        cfg.normalizer.name_converter = "kebab".into();
        assert!(matches!(validate_config(&cfg), Err(ConfigError::Validation(_))));

        let mut cfg = Config::default();
        cfg.normalizer.name_converter = "serialized_name".into();
        assert!(validate_config(&cfg).is_err());
        cfg.normalizer
            .serialized_names
            .insert("firstName".into(), "given_name".into());
        assert!(validate_config(&cfg).is_ok());

        let mut cfg = Config::default();
        cfg.normalizer.serialize_payload_fields = vec!["severity".into(), "severity".into()];
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.normalizer.serialize_payload_fields = vec!["9lives".into()];
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.normalizer.serialize_payload_fields = vec!["meta.severity".into(), "_hint".into()];
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn csv_split() {
        let parts = split_csv("severity, level, , hint");
        assert_eq!(parts, vec!["severity", "level", "hint"]);
    }
}
