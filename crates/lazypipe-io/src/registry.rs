//! Adapter lookup: the first adapter whose `detect` accepts the input loads it.

use serde_json::Value;

use lazypipe_core::config::PipeConfig;
use lazypipe_core::Sequence;

use crate::adapter::{Input, SourceAdapter};
use crate::error::{Error, Result};
use crate::readers::csv::CsvReader;
use crate::readers::jsonl::JsonlReader;

pub struct Registry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Registry {
    /// A registry with no adapters; only the generic wrapper applies.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// CSV (by extension) first, then JSON Lines (by extension or content).
    pub fn with_defaults(config: &PipeConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(CsvReader::from_config(config));
        registry.register(JsonlReader::new(config));
        registry
    }

    pub fn register(&mut self, adapter: impl SourceAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Name of the adapter that would load `input`, if any.
    pub fn detect(&self, input: &Input) -> Option<&'static str> {
        self.adapters
            .iter()
            .find(|a| a.detect(input))
            .map(|a| a.name())
    }

    pub fn load(&self, input: Input) -> Result<Sequence> {
        if let Some(adapter) = self.adapters.iter().find(|a| a.detect(&input)) {
            tracing::debug!(adapter = adapter.name(), input = ?input, "loading source");
            return adapter.load(input);
        }
        tracing::debug!(input = ?input, "no adapter matched; using generic wrapper");
        generic(input)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults(&PipeConfig::default())
    }
}

/// Decoded JSON becomes a collected sequence; plain lines become string
/// values. Anything else is not a recognizable source.
fn generic(input: Input) -> Result<Sequence> {
    match input {
        Input::Json(value) => Ok(Sequence::from_json(value)?),
        Input::Lines(lines) => Ok(Sequence::from_values(
            lines.into_iter().map(Value::String).collect(),
        )),
        other => Err(Error::Detect(format!("no adapter accepts {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_the_first_matching_adapter() {
        let registry = Registry::default();
        assert_eq!(registry.detect(&Input::path("rows.csv")), Some("csv"));
        assert_eq!(registry.detect(&Input::path("rows.jsonl")), Some("jsonl"));
        assert_eq!(registry.detect(&Input::Text("[1, 2]".into())), Some("jsonl"));
        assert_eq!(registry.detect(&Input::Json(json!([]))), None);
    }

    #[test]
    fn generic_wrapper_handles_json_and_lines() {
        let registry = Registry::default();
        let mut seq = registry.load(Input::Json(json!({"a": 1}))).unwrap();
        assert_eq!(seq.count().unwrap(), 1);

        let mut seq = registry
            .load(Input::Lines(vec!["not json".into(), "at all".into()]))
            .unwrap();
        assert_eq!(seq.to_collection().unwrap().to_json(), json!(["not json", "at all"]));
    }

    #[test]
    fn unrecognized_inputs_fail() {
        let registry = Registry::default();
        assert!(matches!(
            registry.load(Input::Text("plain words".into())),
            Err(Error::Detect(_))
        ));
        assert!(matches!(
            registry.load(Input::Json(json!(3))),
            Err(Error::Core(lazypipe_core::Error::InvalidInput(_)))
        ));
    }
}
