//! Config loading from file and environment variables.

use std::path::Path;
use std::str::FromStr;

use super::model::{ConfigError, DecoderConfig};

pub const CONFIG_FILE_ENV: &str = "ELBLOG_CONFIG_FILE";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/elblog/decoder.toml";

impl DecoderConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var(CONFIG_FILE_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading decoder configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DecoderConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ELBLOG_*` overrides. Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(policy) = parse_var(&lookup, "ELBLOG_UNTERMINATED_QUOTE") {
            self.unterminated_quote = policy;
        }
        if let Some(strip) = parse_var(&lookup, "ELBLOG_STRIP_CR") {
            self.strip_carriage_return = strip;
        }
        if let Some(capacity) = parse_var(&lookup, "ELBLOG_READ_BUFFER") {
            self.read_buffer_capacity = capacity;
        }
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "read_buffer_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::QuotePolicy;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    // ── Defaults ────────────────────────────────────────────────

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.unterminated_quote, QuotePolicy::Reject);
        assert!(config.strip_carriage_return);
        assert_eq!(config.read_buffer_capacity, 8192);
        assert!(config.validate().is_ok());
    }

    // ── TOML ────────────────────────────────────────────────────

    #[test]
    fn test_from_toml_partial_keeps_defaults() {
        let config = DecoderConfig::from_toml_str(r#"unterminated_quote = "take_rest""#).unwrap();
        assert_eq!(config.unterminated_quote, QuotePolicy::TakeRest);
        assert!(config.strip_carriage_return);
    }

    #[test]
    fn test_from_toml_full() {
        let config = DecoderConfig::from_toml_str(
            r#"
unterminated_quote = "reject"
strip_carriage_return = false
read_buffer_capacity = 256
"#,
        )
        .unwrap();
        assert!(!config.strip_carriage_return);
        assert_eq!(config.read_buffer_capacity, 256);
    }

    #[test]
    fn test_from_toml_rejects_unknown_policy() {
        let result = DecoderConfig::from_toml_str(r#"unterminated_quote = "guess""#);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_from_toml_validates() {
        let result = DecoderConfig::from_toml_str("read_buffer_capacity = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("elblog-config-{}.toml", std::process::id()));
        std::fs::write(&path, "strip_carriage_return = false\n").unwrap();
        let config = DecoderConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!config.strip_carriage_return);
    }

    #[test]
    fn test_from_missing_file() {
        let result = DecoderConfig::from_file("/nonexistent/elblog/decoder.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    // ── Overrides ───────────────────────────────────────────────

    #[test]
    fn test_overrides_replace_values() {
        let mut config = DecoderConfig::default();
        config.apply_overrides(lookup_from(&[
            ("ELBLOG_UNTERMINATED_QUOTE", "take_rest"),
            ("ELBLOG_STRIP_CR", "false"),
            ("ELBLOG_READ_BUFFER", "1024"),
        ]));
        assert_eq!(config.unterminated_quote, QuotePolicy::TakeRest);
        assert!(!config.strip_carriage_return);
        assert_eq!(config.read_buffer_capacity, 1024);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut config = DecoderConfig::default();
        config.apply_overrides(lookup_from(&[
            ("ELBLOG_STRIP_CR", "sometimes"),
            ("ELBLOG_READ_BUFFER", "lots"),
        ]));
        assert_eq!(config, DecoderConfig::default());
    }
}
