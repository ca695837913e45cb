//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::budget::BufferBudget;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Cap on entries a buffering operator may hold. `None` means unbounded.
    pub max_buffered_entries: Option<usize>,

    /// Prefix of the default label given to unlabeled pipelines.
    pub label_prefix: String,

    /// Field delimiter for CSV sources.
    pub csv_delimiter: u8,

    /// Whether the first CSV row names the fields.
    pub csv_has_headers: bool,

    /// File extensions recognized as JSON Lines without sniffing the content.
    pub jsonl_extensions: Vec<String>,
}

/// Snapshot of the CSV-related settings consumed by the CSV reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            max_buffered_entries: None,
            label_prefix: "pipe".to_string(),
            csv_delimiter: b',',
            csv_has_headers: true,
            jsonl_extensions: vec!["jsonl".to_string(), "ndjson".to_string()],
        }
    }
}

impl PipeConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAZYPIPE_MAX_BUFFERED_ENTRIES`: entry cap for buffering operators
    /// - `LAZYPIPE_LABEL_PREFIX`: default label prefix
    /// - `LAZYPIPE_CSV_DELIMITER`: single-byte CSV delimiter (`\t` accepted)
    /// - `LAZYPIPE_CSV_HEADERS`: `true`/`false`
    /// - `LAZYPIPE_JSONL_EXTENSIONS`: comma-separated extension list
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("LAZYPIPE_MAX_BUFFERED_ENTRIES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_buffered_entries = Some(v);
            }
        }

        if let Ok(s) = std::env::var("LAZYPIPE_LABEL_PREFIX") {
            cfg.label_prefix = s;
        }

        if let Ok(s) = std::env::var("LAZYPIPE_CSV_DELIMITER") {
            if let Some(b) = parse_delimiter(&s) {
                cfg.csv_delimiter = b;
            }
        }

        if let Ok(s) = std::env::var("LAZYPIPE_CSV_HEADERS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.csv_has_headers = v;
            }
        }

        if let Ok(s) = std::env::var("LAZYPIPE_JSONL_EXTENSIONS") {
            cfg.jsonl_extensions = s
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_buffered_entries == Some(0) {
            return Err(Error::Config(
                "max_buffered_entries must be at least 1".into(),
            ));
        }
        if self.label_prefix.is_empty() {
            return Err(Error::Config("label_prefix must not be empty".into()));
        }
        if self.jsonl_extensions.is_empty() {
            return Err(Error::Config(
                "jsonl_extensions must list at least one extension".into(),
            ));
        }
        Ok(())
    }

    pub fn budget(&self) -> BufferBudget {
        BufferBudget::new(self.max_buffered_entries)
    }

    /// Produce the CSV settings snapshot used by the IO layer.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.csv_delimiter,
            has_headers: self.csv_has_headers,
        }
    }

    pub fn is_jsonl_extension(&self, ext: &str) -> bool {
        self.jsonl_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

fn parse_delimiter(s: &str) -> Option<u8> {
    match s {
        "\\t" | "tab" => Some(b'\t'),
        _ if s.len() == 1 => s.bytes().next(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipeConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.budget(), BufferBudget::unbounded());
        assert!(cfg.is_jsonl_extension("JSONL"));
        assert!(!cfg.is_jsonl_extension("csv"));
    }

    #[test]
    fn validate_rejects_zero_budget() {
        let cfg = PipeConfig {
            max_buffered_entries: Some(0),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn deserializes_partial_documents() {
        let cfg: PipeConfig =
            serde_json::from_str(r#"{"max_buffered_entries": 10, "csv_delimiter": 59}"#).unwrap();
        assert_eq!(cfg.max_buffered_entries, Some(10));
        assert_eq!(cfg.csv_options().delimiter, b';');
        assert_eq!(cfg.label_prefix, "pipe");
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter(";"), Some(b';'));
        assert_eq!(parse_delimiter("\\t"), Some(b'\t'));
        assert_eq!(parse_delimiter(";;"), None);
    }
}
