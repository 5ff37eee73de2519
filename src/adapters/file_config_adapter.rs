//! INI file configuration adapter.
//!
//! Section and key lookups are case-insensitive. Values may carry a trailing
//! `; comment` or `# comment` after whitespace.

use crate::domain::error::FundwatchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FundwatchError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| FundwatchError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, FundwatchError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| FundwatchError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        let raw = self.config.get(section, key)?;
        let value = strip_inline_comment(&raw);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

fn strip_inline_comment(raw: &str) -> &str {
    let cut = raw
        .char_indices()
        .find(|&(i, c)| (c == ';' || c == '#') && raw[..i].ends_with(char::is_whitespace))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    raw[..cut].trim()
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.value(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.value(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Non-finite values fall back to `default`.
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.value(section, key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.value(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }

    fn has_section(&self, section: &str) -> bool {
        let wanted = section.to_lowercase();
        self.config.sections().iter().any(|s| *s == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[portfolio]
holdings = 006282,017091

[holding.006282]
name = Europe Equity
init_cost = 1.7831
invest_interval_days = 1

[engine]
risk_window = 60
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "holdings"),
            Some("006282,017091".to_string())
        );
        assert_eq!(
            adapter.get_string("holding.006282", "name"),
            Some("Europe Equity".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[engine]\nrisk_window = 60\n").unwrap();
        assert_eq!(adapter.get_string("engine", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[engine]\nma_period = 20\n").unwrap();
        assert_eq!(adapter.get_int("engine", "ma_period", 0), 20);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert_eq!(adapter.get_int("engine", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[engine]\nma_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("engine", "ma_period", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[holding.a]\ninit_cost = 1.7831\n").unwrap();
        assert_eq!(adapter.get_double("holding.a", "init_cost", 0.0), 1.7831);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[holding.a]\ninit_cost = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("holding.a", "init_cost", 99.9), 99.9);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[notify]\na = true\nb = yes\nc = on\n").unwrap();
        assert!(adapter.get_bool("notify", "a", false));
        assert!(adapter.get_bool("notify", "b", false));
        assert!(adapter.get_bool("notify", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[notify]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("notify", "a", true));
        assert!(!adapter.get_bool("notify", "b", true));
        assert!(!adapter.get_bool("notify", "c", true));
    }

    #[test]
    fn inline_comments_are_stripped() {
        let adapter = FileConfigAdapter::from_string(
            "[engine]\nrisk_window = 60   ; trailing return observations\nrisk_free_rate = 0.025 # annual",
        )
        .unwrap();
        assert_eq!(adapter.get_int("engine", "risk_window", 0), 60);
        assert_eq!(adapter.get_double("engine", "risk_free_rate", 0.0), 0.025);
    }

    #[test]
    fn non_finite_double_uses_default() {
        let adapter = FileConfigAdapter::from_string("[holding.a]\ntarget = inf\n").unwrap();
        assert_eq!(adapter.get_double("holding.a", "target", 0.12), 0.12);
    }

    #[test]
    fn empty_value_is_missing() {
        let adapter = FileConfigAdapter::from_string("[data]\nquotes =\n").unwrap();
        assert_eq!(adapter.get_string("data", "quotes"), None);
    }

    #[test]
    fn has_section_matches_case_insensitively() {
        let adapter = FileConfigAdapter::from_string("[Portfolio]\nholdings = a\n").unwrap();
        assert!(adapter.has_section("portfolio"));
        assert!(adapter.has_section("Portfolio"));
        assert!(!adapter.has_section("engine"));
    }

    #[test]
    fn from_file_reads_config() {
        let content = "[state]\npeak_file = /tmp/peak_record.json\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("state", "peak_file"),
            Some("/tmp/peak_record.json".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(FundwatchError::ConfigParse { .. })));
    }
}
