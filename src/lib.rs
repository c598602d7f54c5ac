//! # csvavro
//!
//! Schema-aware conversion between **delimited text** (CSV, TSV and friends) and
//! **Avro object container files**.
//!
//! ## Key Features
//!
//! - **Both directions** - text to container and container to text, many inputs into one output
//! - **Schema inference** - an all-`string` schema from the header row when none is given
//! - **Typed coercion** - text cells become `int`, `long`, `float`, `double`, `boolean`, `bytes` or `null`, with field defaults as fallback
//! - **Dialect sniffing** - delimiter and header detection from a sample of the first input
//! - **Append mode** - add records to an existing container or rows to an existing text file
//! - **Compressed text** - gzip, zstd, bzip2 and xz inputs and outputs (optional via feature flags)
//!
//! ## Quick Start
//!
//! ```no_run
//! use csvavro::{ConvertOptions, Direction, run};
//! use std::path::{Path, PathBuf};
//! # fn main() -> csvavro::Result<()> {
//! let inputs = vec![PathBuf::from("people.csv")];
//! let summary = run(
//!     Direction::ToContainer,
//!     &inputs,
//!     Path::new("people.avro"),
//!     &ConvertOptions::new().with_overwrite(true),
//! )?;
//! println!("{} records", summary.records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Schema
//!
//! A [`Schema`] is an ordered list of named [`Field`]s, each with a [`PrimitiveType`] and an
//! optional default. It is resolved once per run and never changes afterwards.
//!
//! ### Coercion
//!
//! [`PrimitiveType::coerce`] turns one text cell into a [`Value`]; [`coerce_row`] applies it
//! across a row, falling back to field defaults. Failures carry the column, and the
//! pipelines add the file and line.
//!
//! ### Pipelines
//!
//! [`text_to_container`] and [`container_to_text`] stream one row or record at a time and
//! stop at the first error. [`run`] dispatches on a [`Direction`].

pub mod convert;
pub mod dialect;
pub mod error;
pub mod io;
pub mod record;
pub mod schema;
pub mod testing;
pub mod types;

pub use convert::{
    ConversionSummary, ConvertOptions, Direction, container_to_text, run, text_to_container,
};
pub use dialect::{Dialect, Sniffer};
pub use error::{CoerceError, ConversionError, ConvertError, Result};
pub use io::container::Compression;
pub use io::glob::expand_inputs;
pub use record::{Record, RecordBuilder, coerce_row};
pub use schema::{Field, Schema};
pub use types::{PrimitiveType, Value};
