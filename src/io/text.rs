//! Delimited text reading and writing.
//!
//! Both directions go through the `csv` crate so quoting is symmetric: whatever the
//! writer quotes (delimiters, quotes, line breaks inside a value), the reader splits
//! back correctly. Compression is transparent on both sides.

use crate::error::{ConvertError, Result};
use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::record::Record;
use csv::{QuoteStyle, Terminator};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Read at most `limit` (decompressed) bytes from the start of `path`.
///
/// When the limit cuts a line, the partial last line is dropped.
///
/// # Errors
/// [`ConvertError::Io`] when the file cannot be opened or read.
pub fn read_sample(path: &Path, limit: usize) -> Result<String> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let reader = auto_detect_reader(file, path).map_err(|e| ConvertError::io(path, e))?;
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    reader
        .take(limit as u64)
        .read_to_end(&mut buf)
        .map_err(|e| ConvertError::io(path, e))?;
    if buf.len() == limit
        && let Some(end) = buf.iter().rposition(|&b| b == b'\n')
    {
        buf.truncate(end + 1);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Streaming row reader over one delimited text file.
pub struct TextReader {
    path: PathBuf,
    inner: csv::Reader<Box<dyn Read>>,
    row: csv::StringRecord,
}

impl TextReader {
    /// Open `path` for reading rows split on `delimiter`.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when the file cannot be opened.
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        let reader = auto_detect_reader(file, path).map_err(|e| ConvertError::io(path, e))?;
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            row: csv::StringRecord::new(),
        })
    }

    /// Advance to the next row, returning its 1-based starting line and its cells.
    ///
    /// # Errors
    /// [`ConvertError::Csv`] on malformed input or invalid UTF-8.
    pub fn next_row(&mut self) -> Result<Option<(u64, Vec<&str>)>> {
        let more = self
            .inner
            .read_record(&mut self.row)
            .map_err(|e| ConvertError::csv(&self.path, e))?;
        if !more {
            return Ok(None);
        }
        let line = self.row.position().map_or(0, csv::Position::line);
        Ok(Some((line, self.row.iter().collect())))
    }
}

/// Delimited text output.
pub struct TextWriter {
    path: PathBuf,
    inner: csv::Writer<Box<dyn Write>>,
    has_content: bool,
    rows: u64,
}

impl TextWriter {
    /// Create (truncating) or, with `append`, extend the file at `path`.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when the file cannot be opened.
    pub fn open(path: &Path, delimiter: u8, append: bool) -> Result<Self> {
        let file = if append {
            OpenOptions::new().create(true).append(true).open(path)
        } else {
            File::create(path)
        }
        .map_err(|e| ConvertError::io(path, e))?;
        let has_content = append
            && file
                .metadata()
                .map_err(|e| ConvertError::io(path, e))?
                .len()
                > 0;
        let writer = auto_detect_writer(file, path).map_err(|e| ConvertError::io(path, e))?;
        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        Ok(Self {
            path: path.to_path_buf(),
            inner,
            has_content,
            rows: 0,
        })
    }

    /// Whether the file already held data when it was opened for appending.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.has_content
    }

    /// Write a header row of column names.
    ///
    /// # Errors
    /// [`ConvertError::Csv`] on write failure.
    pub fn write_header<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        self.inner
            .write_record(names)
            .map_err(|e| ConvertError::csv(&self.path, e))
    }

    /// Write one record as a row, values in record order.
    ///
    /// # Errors
    /// [`ConvertError::Csv`] on write failure.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let cells: Vec<_> = record.values().map(|v| v.to_text_bytes()).collect();
        self.inner
            .write_record(cells.iter().map(|c| &c[..]))
            .map_err(|e| ConvertError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush everything and close the file. Returns the number of data rows written.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when flushing fails.
    pub fn finish(self) -> Result<u64> {
        let mut inner = self
            .inner
            .into_inner()
            .map_err(|e| ConvertError::io(&self.path, e.into_error()))?;
        inner.flush().map_err(|e| ConvertError::io(&self.path, e))?;
        Ok(self.rows)
    }
}
