//! The two conversion pipelines and their options.
//!
//! [`text_to_container`] and [`container_to_text`] are straight-line streaming loops:
//! one row or record in flight at a time, files processed in the order given, and the
//! first failure ends the run. An aborted run leaves a partial output file behind.

use crate::dialect::{Dialect, SAMPLE_BYTES, Sniffer, unescape_delimiter};
use crate::error::{ConvertError, Result};
use crate::io::container::{Compression, ContainerHeader, ContainerReader, ContainerWriter};
use crate::io::text::{TextReader, TextWriter, read_sample};
use crate::record::{Record, coerce_row};
use crate::schema::{Schema, resolve, sanitize_name};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Which way to convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Delimited text in, Avro container out.
    #[default]
    ToContainer,
    /// Avro containers in, delimited text out.
    ToText,
}

/// Options shared by both pipelines.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Add to an existing output file instead of replacing it.
    pub append: bool,
    /// Explicit Avro JSON schema file.
    pub schema: Option<PathBuf>,
    /// Record name to use instead of the schema's or the first input's.
    pub record_name: Option<String>,
    /// Block codec for new containers.
    pub compression: Compression,
    /// Raw delimiter as typed by the user; escapes such as `\t` are allowed.
    pub delimiter: Option<String>,
    /// Header row presence; `None` means sniff it (text input) or omit it (text output).
    pub header: Option<bool>,
}

impl ConvertOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_record_name(mut self, name: impl Into<String>) -> Self {
        self.record_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }

    /// Check option combinations. Touches no files.
    ///
    /// # Errors
    /// [`ConvertError::Validation`] for `overwrite` together with `append`, or a delimiter
    /// that is not a single ASCII character.
    pub fn validate(&self) -> Result<()> {
        if self.overwrite && self.append {
            return Err(ConvertError::Validation(
                "overwrite and append are mutually exclusive".into(),
            ));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    /// The unescaped delimiter, if one was given.
    ///
    /// # Errors
    /// See [`unescape_delimiter`].
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter.as_deref().map(unescape_delimiter).transpose()
    }

    fn explicit_schema(&self) -> Result<Option<Schema>> {
        let Some(path) = &self.schema else {
            return Ok(None);
        };
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let schema = Schema::parse(&text).map_err(|e| match e {
            ConvertError::Schema(msg) => ConvertError::Schema(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        Ok(Some(match &self.record_name {
            Some(name) => schema.with_name(name.clone())?,
            None => schema,
        }))
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub files: usize,
    pub records: u64,
}

/// Validate options and inputs, then run the pipeline for `direction`.
///
/// # Errors
/// Any error of the selected pipeline.
pub fn run(
    direction: Direction,
    inputs: &[PathBuf],
    output: &Path,
    opts: &ConvertOptions,
) -> Result<ConversionSummary> {
    match direction {
        Direction::ToContainer => text_to_container(inputs, output, opts),
        Direction::ToText => container_to_text(inputs, output, opts),
    }
}

// Startup checks shared by both pipelines, in order: options, inputs, output state.
fn preflight<'a>(inputs: &'a [PathBuf], output: &Path, opts: &ConvertOptions) -> Result<&'a Path> {
    opts.validate()?;
    let first = inputs
        .first()
        .map(PathBuf::as_path)
        .ok_or_else(|| ConvertError::Validation("at least one input file is required".into()))?;
    if output.exists() && !opts.overwrite && !opts.append {
        return Err(ConvertError::Precondition(format!(
            "output {} already exists; pass overwrite or append",
            output.display()
        )));
    }
    Ok(first)
}

/// Convert delimited text files into one Avro container.
///
/// The first input is sampled to sniff whatever the options leave open (delimiter,
/// header presence) and, without an explicit schema, to infer an all-`string` schema
/// from its header row. Rows of every input are then coerced and appended in order.
/// When appending onto an existing container its embedded schema is used instead.
///
/// # Errors
/// - [`ConvertError::Validation`] / [`ConvertError::Precondition`] before any I/O
/// - [`ConvertError::Schema`] when no usable schema can be resolved
/// - [`ConvertError::Conversion`] for the first row that cannot be coerced
/// - I/O, CSV and Avro errors with the offending path
pub fn text_to_container(
    inputs: &[PathBuf],
    output: &Path,
    opts: &ConvertOptions,
) -> Result<ConversionSummary> {
    let first = preflight(inputs, output, opts)?;
    let appending = opts.append && output.exists();
    if appending && opts.compression != Compression::None {
        warn!("compression is fixed when the container is created; keeping the existing codec");
    }
    if opts.append && !appending {
        info!(output = %output.display(), "append target does not exist; creating it");
    }

    let sample = read_sample(first, SAMPLE_BYTES)?;
    let dialect = resolve_dialect(&sample, opts)?;
    debug!(
        delimiter = %char::from(dialect.delimiter).escape_default(),
        has_header = dialect.has_header,
        "resolved dialect"
    );
    let explicit = opts.explicit_schema()?;

    let header;
    let fresh;
    let (schema, mut writer) = if appending {
        header = ContainerHeader::read(output)?;
        let embedded = Schema::from_avro(header.schema())?;
        if let Some(explicit) = &explicit {
            explicit.ensure_same_shape(&embedded)?;
        }
        (embedded, ContainerWriter::append(output, &header)?)
    } else {
        let schema = match explicit {
            Some(schema) => schema,
            None => resolve(None, &sample, dialect, &record_name_hint(first, opts))?,
        };
        fresh = schema.to_avro()?;
        let writer = ContainerWriter::create(output, &fresh, opts.compression)?;
        (schema, writer)
    };
    debug!(record = %schema.name, fields = schema.fields.len(), "resolved schema");
    info!(
        inputs = inputs.len(),
        output = %output.display(),
        append = appending,
        "converting text to container"
    );

    for path in inputs {
        let mut reader = TextReader::open(path, dialect.delimiter)?;
        let mut skip_header = dialect.has_header;
        let mut rows = 0u64;
        while let Some((line, cells)) = reader.next_row()? {
            if std::mem::take(&mut skip_header) {
                continue;
            }
            let record = coerce_row(&schema.fields, &cells).map_err(|source| {
                error!(file = %path.display(), line, "{source}");
                ConvertError::Conversion {
                    path: path.clone(),
                    line,
                    source,
                }
            })?;
            writer.append_record(record)?;
            rows += 1;
        }
        info!(file = %path.display(), rows, "input consumed");
    }

    let records = writer.close()?;
    info!(records, "container written");
    Ok(ConversionSummary {
        files: inputs.len(),
        records,
    })
}

/// Convert Avro containers into one delimited text file.
///
/// Columns follow the explicit schema when one is given (records are projected onto
/// it), otherwise the embedded schema of the first container.
///
/// # Errors
/// - [`ConvertError::Validation`] / [`ConvertError::Precondition`] before any I/O
/// - [`ConvertError::Schema`] when a container cannot be read with the column schema
/// - I/O, CSV and Avro errors with the offending path
pub fn container_to_text(
    inputs: &[PathBuf],
    output: &Path,
    opts: &ConvertOptions,
) -> Result<ConversionSummary> {
    let first = preflight(inputs, output, opts)?;
    if opts.compression != Compression::None {
        warn!("compression applies to container output only; ignoring it");
    }

    let explicit = opts.explicit_schema()?;
    let projection = explicit.as_ref().map(Schema::to_avro).transpose()?;
    let schema = match explicit {
        Some(schema) => schema,
        None => Schema::from_avro(ContainerHeader::read(first)?.schema())?,
    };
    debug!(record = %schema.name, fields = schema.fields.len(), "resolved schema");

    let delimiter = opts.delimiter_byte()?.unwrap_or(b',');
    let mut sink = TextWriter::open(output, delimiter, opts.append)?;
    if opts.header == Some(true) && !sink.has_content() {
        sink.write_header(schema.field_names())?;
    }
    info!(
        inputs = inputs.len(),
        output = %output.display(),
        "converting container to text"
    );

    for path in inputs {
        let embedded = Schema::from_avro(ContainerHeader::read(path)?.schema())?;
        schema.check_readable_from(&embedded).map_err(|e| match e {
            ConvertError::Schema(msg) => ConvertError::Schema(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        let mut rows = 0u64;
        for value in ContainerReader::open(path, projection.as_ref())? {
            let record = Record::from_avro(value?, &schema.fields)?;
            sink.write_record(&record)?;
            rows += 1;
        }
        info!(file = %path.display(), rows, "container consumed");
    }

    let records = sink.finish()?;
    info!(records, "text written");
    Ok(ConversionSummary {
        files: inputs.len(),
        records,
    })
}

fn resolve_dialect(sample: &str, opts: &ConvertOptions) -> Result<Dialect> {
    let sniffer = Sniffer::new();
    let delimiter = match opts.delimiter_byte()? {
        Some(d) => d,
        None => sniffer.sniff_delimiter(sample),
    };
    let has_header = opts
        .header
        .unwrap_or_else(|| sniffer.has_header(sample, delimiter));
    Ok(Dialect {
        delimiter,
        has_header,
    })
}

fn record_name_hint(first: &Path, opts: &ConvertOptions) -> String {
    match &opts.record_name {
        Some(name) => name.clone(),
        None => first
            .file_stem()
            .map_or_else(|| "record".to_string(), |s| sanitize_name(&s.to_string_lossy())),
    }
}
