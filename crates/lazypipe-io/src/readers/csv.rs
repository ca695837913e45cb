//! CSV source. With headers, each row becomes an object of strings keyed by
//! the header names; without, each row is an array of strings.

use std::io::Read;

use serde_json::{Map, Value};

use lazypipe_core::config::{CsvOptions, PipeConfig};
use lazypipe_core::item::Item;
use lazypipe_core::key::Key;
use lazypipe_core::sequence::Entry;
use lazypipe_core::Sequence;

use crate::adapter::{Input, SourceAdapter};
use crate::error::{Error, Result};

pub struct CsvReader {
    options: CsvOptions,
}

impl CsvReader {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &PipeConfig) -> Self {
        Self::new(config.csv_options())
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new(CsvOptions::default())
    }
}

impl SourceAdapter for CsvReader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn detect(&self, input: &Input) -> bool {
        matches!(input.extension().as_deref(), Some("csv" | "tsv"))
    }

    fn load(&self, input: Input) -> Result<Sequence> {
        let delimiter = match input.extension().as_deref() {
            Some("tsv") => b'\t',
            _ => self.options.delimiter,
        };
        let source = input
            .into_read()?
            .ok_or_else(|| Error::Detect("CSV needs text, not a decoded JSON value".into()))?;

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.options.has_headers)
            .from_reader(source);
        let headers: Option<Vec<String>> = if self.options.has_headers {
            Some(reader.headers()?.iter().map(str::to_owned).collect())
        } else {
            None
        };

        Ok(Sequence::from_results(Rows {
            records: reader.into_records(),
            headers,
            next_key: 0,
        }))
    }
}

struct Rows {
    records: ::csv::StringRecordsIntoIter<Box<dyn Read>>,
    headers: Option<Vec<String>>,
    next_key: i64,
}

impl Rows {
    fn to_value(&self, record: &::csv::StringRecord) -> Value {
        match &self.headers {
            Some(names) => {
                let mut row = Map::with_capacity(names.len());
                for (name, field) in names.iter().zip(record.iter()) {
                    row.insert(name.clone(), Value::String(field.to_owned()));
                }
                Value::Object(row)
            }
            None => Value::Array(
                record
                    .iter()
                    .map(|field| Value::String(field.to_owned()))
                    .collect(),
            ),
        }
    }
}

impl Iterator for Rows {
    type Item = lazypipe_core::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(Error::from(e).into())),
        };
        let key = Key::Int(self.next_key);
        self.next_key += 1;
        tracing::trace!(row = self.next_key, "decoded CSV row");
        Some(Ok((key, Item::Single(self.to_value(&record)))))
    }
}
