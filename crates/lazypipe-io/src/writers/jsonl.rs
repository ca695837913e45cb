//! Streaming NDJSON writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use lazypipe_core::sequence::Entry;

use crate::error::Result;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    written: u64,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Write each entry's value as one line, stopping at the first error.
    pub fn write_entries<I>(&mut self, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = lazypipe_core::Result<Entry>>,
    {
        let mut n = 0;
        for entry in entries {
            let (_, item) = entry?;
            self.write_value(&item.as_value())?;
            n += 1;
        }
        self.writer.flush()?;
        Ok(n)
    }

    /// Lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazypipe_core::Sequence;
    use serde_json::json;

    #[test]
    fn writes_one_document_per_line() {
        let seq = Sequence::from_values(vec![json!({"a": 1}), json!("x")]);
        let mut writer = JsonlWriter::to_writer(Vec::new());
        assert_eq!(writer.write_entries(seq).unwrap(), 2);
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "{\"a\":1}\n\"x\"\n");
    }
}
