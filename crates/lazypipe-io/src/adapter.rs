//! Source inputs and the adapter trait.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use lazypipe_core::Sequence;

use crate::error::Result;

/// Anything a pipeline can be loaded from.
pub enum Input {
    Path(PathBuf),
    /// Raw text, split on line breaks by line-oriented adapters.
    Text(String),
    Lines(Vec<String>),
    Reader(PeekedReader),
    Json(Value),
}

impl Input {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        Input::Path(p.into())
    }

    /// Wrap a stream; its first line is read now so adapters can sniff it.
    pub fn reader(r: impl BufRead + 'static) -> Result<Self> {
        Ok(Input::Reader(PeekedReader::new(r)?))
    }

    /// Lower-cased file extension, for path inputs.
    pub fn extension(&self) -> Option<String> {
        match self {
            Input::Path(p) => p
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase),
            _ => None,
        }
    }

    /// First line of the content, without its line break.
    ///
    /// Path inputs open the file; an unreadable file has no first line.
    pub fn first_line(&self) -> Option<String> {
        match self {
            Input::Path(p) => read_first_line(p),
            Input::Text(s) => s.lines().next().map(str::to_owned),
            Input::Lines(lines) => lines.first().cloned(),
            Input::Reader(r) => Some(r.first_line().to_owned()),
            Input::Json(_) => None,
        }
    }

    /// Open the content as a byte stream. `Json` inputs have none.
    pub(crate) fn into_read(self) -> Result<Option<Box<dyn Read>>> {
        let reader: Box<dyn Read> = match self {
            Input::Path(p) => Box::new(BufReader::new(File::open(p)?)),
            Input::Text(s) => Box::new(Cursor::new(s.into_bytes())),
            Input::Lines(lines) => Box::new(Cursor::new(lines.join("\n").into_bytes())),
            Input::Reader(r) => Box::new(r.into_reader()),
            Input::Json(_) => return Ok(None),
        };
        Ok(Some(reader))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(p) => f.debug_tuple("Input::Path").field(p).finish(),
            Input::Text(s) => write!(f, "Input::Text({} bytes)", s.len()),
            Input::Lines(l) => write!(f, "Input::Lines({} lines)", l.len()),
            Input::Reader(_) => f.write_str("Input::Reader"),
            Input::Json(_) => f.write_str("Input::Json"),
        }
    }
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Json(v)
    }
}

impl From<Vec<String>> for Input {
    fn from(lines: Vec<String>) -> Self {
        Input::Lines(lines)
    }
}

impl From<PathBuf> for Input {
    fn from(p: PathBuf) -> Self {
        Input::Path(p)
    }
}

impl From<&Path> for Input {
    fn from(p: &Path) -> Self {
        Input::Path(p.to_path_buf())
    }
}

fn read_first_line(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).ok()?;
    Some(line.trim_end_matches(&['\r', '\n'][..]).to_owned())
}

/// A reader whose first line has already been pulled off.
pub struct PeekedReader {
    head: String,
    rest: Box<dyn BufRead>,
}

impl PeekedReader {
    pub fn new(r: impl BufRead + 'static) -> Result<Self> {
        let mut rest: Box<dyn BufRead> = Box::new(r);
        let mut head = String::new();
        rest.read_line(&mut head)?;
        Ok(Self { head, rest })
    }

    pub fn first_line(&self) -> &str {
        self.head.trim_end_matches(&['\r', '\n'][..])
    }

    /// The full stream again, first line included.
    pub fn into_reader(self) -> impl BufRead {
        Cursor::new(self.head.into_bytes()).chain(self.rest)
    }
}

/// A named source format.
pub trait SourceAdapter {
    fn name(&self) -> &'static str;

    /// Whether this adapter recognizes the input.
    fn detect(&self, input: &Input) -> bool;

    /// Turn the input into a sequence. Per-record decode failures surface as
    /// `lazypipe_core::Error::Source` at the pull that reaches them.
    fn load(&self, input: Input) -> Result<Sequence>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peeked_reader_replays_its_head() {
        let peeked = PeekedReader::new(Cursor::new("first\nsecond\n")).unwrap();
        assert_eq!(peeked.first_line(), "first");
        let mut all = String::new();
        peeked.into_reader().read_to_string(&mut all).unwrap();
        assert_eq!(all, "first\nsecond\n");
    }

    #[test]
    fn first_line_of_text_and_lines() {
        assert_eq!(Input::Text("a\nb".into()).first_line().as_deref(), Some("a"));
        assert_eq!(
            Input::Lines(vec!["x".into()]).first_line().as_deref(),
            Some("x")
        );
        assert!(Input::Json(Value::Null).first_line().is_none());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(Input::path("data/Rows.JSONL").extension().as_deref(), Some("jsonl"));
        assert!(Input::Text(String::new()).extension().is_none());
    }
}
