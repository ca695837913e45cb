//! Built-in source adapters.

pub mod csv;
pub mod jsonl;
