//! JSON Lines source: one JSON document per line, decoded lazily.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use serde_json::Value;

use lazypipe_core::config::PipeConfig;
use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::Entry;
use lazypipe_core::Sequence;

use crate::adapter::{Input, SourceAdapter};
use crate::error::{Error, Result};

type Lines = Box<dyn Iterator<Item = io::Result<String>>>;

pub struct JsonlReader {
    extensions: Vec<String>,
}

impl JsonlReader {
    pub fn new(config: &PipeConfig) -> Self {
        Self {
            extensions: config.jsonl_extensions.clone(),
        }
    }

    fn lines(input: Input) -> Result<Lines> {
        let lines: Lines = match input {
            Input::Path(p) => Box::new(BufReader::new(File::open(p)?).lines()),
            Input::Text(s) => {
                let owned: Vec<String> = s.lines().map(str::to_owned).collect();
                Box::new(owned.into_iter().map(Ok::<String, io::Error>))
            }
            Input::Lines(lines) => Box::new(lines.into_iter().map(Ok::<String, io::Error>)),
            Input::Reader(r) => Box::new(r.into_reader().lines()),
            Input::Json(_) => {
                return Err(Error::Detect(
                    "JSON Lines needs text, not a decoded JSON value".into(),
                ))
            }
        };
        Ok(lines)
    }
}

impl Default for JsonlReader {
    fn default() -> Self {
        Self::new(&PipeConfig::default())
    }
}

impl SourceAdapter for JsonlReader {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn detect(&self, input: &Input) -> bool {
        if let Some(ext) = input.extension() {
            if self.extensions.iter().any(|known| known.eq_ignore_ascii_case(&ext)) {
                return true;
            }
        }
        match input.first_line() {
            Some(line) => {
                let line = line.trim();
                !line.is_empty() && serde_json::from_str::<Value>(line).is_ok()
            }
            None => false,
        }
    }

    fn load(&self, input: Input) -> Result<Sequence> {
        Ok(Sequence::from_results(Records {
            lines: Self::lines(input)?,
            line_no: 0,
            next_key: 0,
        }))
    }
}

/// Decodes one record per non-blank line, keyed `0..`.
struct Records {
    lines: Lines,
    line_no: usize,
    next_key: i64,
}

impl Iterator for Records {
    type Item = lazypipe_core::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(lazypipe_core::Error::Source(format!(
                        "line {}: {}",
                        self.line_no, e
                    ))))
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            tracing::trace!(line = self.line_no, "decoding JSON Lines record");
            return Some(match serde_json::from_str::<Value>(&line) {
                Ok(value) => {
                    let key = Key::Int(self.next_key);
                    self.next_key += 1;
                    Ok((key, Item::Single(value)))
                }
                Err(e) => Err(lazypipe_core::Error::Source(format!(
                    "line {}: {}",
                    self.line_no, e
                ))),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_by_extension_or_content() {
        let reader = JsonlReader::default();
        assert!(reader.detect(&Input::path("missing/file.ndjson")));
        assert!(reader.detect(&Input::Text("{\"a\": 1}\n{\"a\": 2}".into())));
        assert!(!reader.detect(&Input::Text("a,b\n1,2".into())));
        assert!(!reader.detect(&Input::Text(String::new())));
    }

    #[test]
    fn skips_blank_lines_and_keys_records() {
        let mut seq = JsonlReader::default()
            .load(Input::Text("{\"a\": 1}\n\n  \n{\"a\": 2}\n".into()))
            .unwrap();
        let c = seq.to_collection().unwrap();
        assert_eq!(c.to_json(), json!([{"a": 1}, {"a": 2}]));
    }

    #[test]
    fn bad_lines_fail_at_the_pull() {
        let seq = JsonlReader::default()
            .load(Input::Lines(vec!["1".into(), "{oops".into(), "3".into()]))
            .unwrap();
        let out: Vec<_> = seq.into_iter().collect();
        assert!(out[0].is_ok());
        match &out[1] {
            Err(lazypipe_core::Error::Source(msg)) => assert!(msg.starts_with("line 2")),
            other => panic!("expected a source error, got {:?}", other),
        }
        assert!(out[2].is_ok());
    }

    #[test]
    fn json_values_are_rejected() {
        assert!(matches!(
            JsonlReader::default().load(Input::Json(json!([1]))),
            Err(Error::Detect(_))
        ));
    }
}
