//! Process-wide configuration (spec.md §6 ambient). `key:value` lines,
//! `#`-comments, no crate in the dependency stack parses this particular
//! ad hoc format so the parser is hand-rolled; line-oriented style
//! inspired by `dotenv`, already a dependency for `.env` loading.

use crate::error::{EasError, EasResult};
use std::collections::HashMap;
use std::path::Path;

/// Process-wide, immutable once loaded (spec.md §5 shared-resource policy).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub store_dsn: String,
    pub broker_url: String,
    pub archive_root: String,
    pub log_level: String,
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> EasResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    pub fn from_str(text: &str) -> EasResult<Self> {
        let entries = parse_kv(text)?;
        let required = |key: &str| -> EasResult<String> {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| EasError::Config(format!("missing required key '{key}'")))
        };
        Ok(EngineConfig {
            store_dsn: required("store_dsn")?,
            broker_url: required("broker_url")?,
            archive_root: required("archive_root")?,
            log_level: entries
                .get("log_level")
                .cloned()
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Parse `key:value` or `key=value` lines, skipping blank lines and
/// `#`-comments. Last assignment to a key wins.
fn parse_kv(text: &str) -> EasResult<HashMap<String, String>> {
    let mut entries = HashMap::new();
    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let split_pos = line
            .find(':')
            .or_else(|| line.find('='))
            .ok_or_else(|| {
                EasError::Config(format!("line {}: expected 'key:value' or 'key=value'", lineno + 1))
            })?;
        let key = line[..split_pos].trim().to_string();
        let value = line[split_pos + 1..].trim().to_string();
        if key.is_empty() {
            return Err(EasError::Config(format!("line {}: empty key", lineno + 1)));
        }
        entries.insert(key, value);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let text = "\
            # comment line\n\
            store_dsn: postgres://localhost/eas\n\
            broker_url: amqp://localhost//\n\
            archive_root: /var/lib/eas/archive\n\
        ";
        let config = EngineConfig::from_str(text).unwrap();
        assert_eq!(config.store_dsn, "postgres://localhost/eas");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn accepts_equals_separator_too() {
        let text = "store_dsn=postgres://x\nbroker_url=amqp://y\narchive_root=/tmp\nlog_level=debug\n";
        let config = EngineConfig::from_str(text).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn rejects_missing_required_key() {
        let text = "store_dsn: postgres://x\n";
        assert!(EngineConfig::from_str(text).is_err());
    }

    #[test]
    fn rejects_malformed_line() {
        let text = "store_dsn: postgres://x\nbroker_url: amqp://y\narchive_root: /tmp\nnotakeyvalue\n";
        assert!(EngineConfig::from_str(text).is_err());
    }
}
