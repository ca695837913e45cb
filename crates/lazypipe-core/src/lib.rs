#![forbid(unsafe_code)]
//! lazypipe-core: shared kernel for the lazypipe engine.
//!
//! This crate contains the data model every other crate speaks: keys, fold
//! items, lazy sequences and the collections they materialize into, plus the
//! accessor and configuration interfaces. There is **no I/O** here.
//!
//! Crates that use this:
//! - lazypipe-operators: builds `Pipeline` and every operator on `Sequence`.
//! - lazypipe-io: implements source adapters that yield `Sequence`s.
//! - lazypipe-cli: wires config, adapters and operators together.

pub mod accessor;
pub mod budget;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod item;
pub mod key;
pub mod prelude;
pub mod sequence;

pub use error::{Error, Result};
pub use item::{Args, Item};
pub use key::Key;
pub use sequence::{Collection, Entry, Sequence, Stage};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
