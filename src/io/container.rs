//! Avro object container files.
//!
//! Writers either start a fresh container (header with embedded schema and codec) or
//! continue an existing one, in which case the header is read back with
//! [`ContainerHeader::read`] and new blocks are appended with the same codec and sync
//! marker. Readers decode natively or project onto a caller-supplied schema.

use crate::error::{ConvertError, Result};
use crate::record::Record;
use apache_avro::types::Value as AvroValue;
use apache_avro::{Codec, Reader, Schema as AvroSchema, Writer};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"Obj\x01";
const SCHEMA_KEY: &str = "avro.schema";
const CODEC_KEY: &str = "avro.codec";

/// Block compression for new containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Deflate,
}

impl Compression {
    /// Avro codec name as stored in the container header.
    #[must_use]
    pub const fn codec_name(self) -> &'static str {
        match self {
            Self::None => "null",
            Self::Deflate => "deflate",
        }
    }

    fn codec(self) -> Result<Codec> {
        parse_codec(self.codec_name())
    }
}

fn parse_codec(name: &str) -> Result<Codec> {
    name.parse::<Codec>()
        .map_err(|_| ConvertError::Schema(format!("unsupported container codec {name:?}")))
}

/// Header of an existing container: embedded schema, codec and sync marker.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    schema: AvroSchema,
    codec_name: String,
    marker: [u8; 16],
}

impl ContainerHeader {
    /// Read just the header of the container at `path`.
    ///
    /// # Errors
    /// [`ConvertError::Io`] if the file cannot be read, [`ConvertError::Schema`] if it is
    /// not an Avro container or its embedded schema does not parse.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let not_a_container =
            || ConvertError::Schema(format!("{} is not an Avro container file", path.display()));

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|_| not_a_container())?;
        if &magic != MAGIC {
            return Err(not_a_container());
        }

        let metadata = read_metadata(&mut reader).map_err(|_| not_a_container())?;
        let mut marker = [0u8; 16];
        reader.read_exact(&mut marker).map_err(|_| not_a_container())?;

        let schema_json = metadata.get(SCHEMA_KEY).ok_or_else(not_a_container)?;
        let schema = AvroSchema::parse_str(&String::from_utf8_lossy(schema_json)).map_err(|e| {
            ConvertError::Schema(format!(
                "embedded schema of {} does not parse: {e}",
                path.display()
            ))
        })?;
        let codec_name = metadata
            .get(CODEC_KEY)
            .map_or_else(|| "null".to_string(), |c| String::from_utf8_lossy(c).into_owned());

        Ok(Self {
            schema,
            codec_name,
            marker,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    #[must_use]
    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }
}

// The header metadata is an Avro `map<bytes>` datum right after the magic.
fn read_metadata<R: Read>(
    reader: &mut R,
) -> Result<HashMap<String, Vec<u8>>, apache_avro::Error> {
    let map_schema = AvroSchema::parse_str(r#"{"type": "map", "values": "bytes"}"#)?;
    let datum = apache_avro::from_avro_datum(&map_schema, reader, None)?;
    let mut out = HashMap::new();
    if let AvroValue::Map(entries) = datum {
        for (key, value) in entries {
            if let AvroValue::Bytes(bytes) = value {
                out.insert(key, bytes);
            }
        }
    }
    Ok(out)
}

/// Sequential record writer for one container file.
pub struct ContainerWriter<'a> {
    path: PathBuf,
    inner: Writer<'a, BufWriter<File>>,
    written: u64,
}

impl<'a> ContainerWriter<'a> {
    /// Create (or truncate) `path` as a fresh container embedding `schema`.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when the file cannot be created.
    pub fn create(path: &Path, schema: &'a AvroSchema, compression: Compression) -> Result<Self> {
        let codec = compression.codec()?;
        let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Writer::with_codec(schema, BufWriter::new(file), codec),
            written: 0,
        })
    }

    /// Continue the existing container at `path`, described by `header`.
    ///
    /// No header is written; new blocks use the container's own codec and marker.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when the file cannot be opened for appending,
    /// [`ConvertError::Schema`] when the container uses a codec this build cannot write.
    pub fn append(path: &Path, header: &'a ContainerHeader) -> Result<Self> {
        let codec = parse_codec(&header.codec_name)?;
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| ConvertError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Writer::append_to_with_codec(
                &header.schema,
                BufWriter::new(file),
                codec,
                header.marker,
            ),
            written: 0,
        })
    }

    /// Append one sealed record.
    ///
    /// # Errors
    /// [`ConvertError::Avro`] when the record does not match the embedded schema or the
    /// write fails.
    pub fn append_record(&mut self, record: Record) -> Result<()> {
        self.inner
            .append(AvroValue::from(record))
            .map_err(|e| ConvertError::avro(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Flush the last block and close the file. Returns the number of records written.
    ///
    /// # Errors
    /// [`ConvertError::Avro`] or [`ConvertError::Io`] when flushing fails.
    pub fn close(self) -> Result<u64> {
        let buffered = self
            .inner
            .into_inner()
            .map_err(|e| ConvertError::avro(&self.path, e))?;
        buffered
            .into_inner()
            .map_err(|e| ConvertError::io(&self.path, e.into_error()))?;
        Ok(self.written)
    }
}

/// Iterator over the records of one container file.
pub struct ContainerReader<'a> {
    path: PathBuf,
    inner: Reader<'a, BufReader<File>>,
}

impl<'a> ContainerReader<'a> {
    /// Open `path`, decoding with its own schema or, if given, resolving each record
    /// onto `projection`.
    ///
    /// # Errors
    /// [`ConvertError::Io`] when the file cannot be opened, [`ConvertError::Avro`] when its
    /// header cannot be decoded.
    pub fn open(path: &Path, projection: Option<&'a AvroSchema>) -> Result<Self> {
        let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
        let buffered = BufReader::new(file);
        let inner = match projection {
            Some(schema) => Reader::with_schema(schema, buffered),
            None => Reader::new(buffered),
        }
        .map_err(|e| ConvertError::avro(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    #[must_use]
    pub fn embedded_schema(&self) -> &AvroSchema {
        self.inner.writer_schema()
    }
}

impl Iterator for ContainerReader<'_> {
    type Item = Result<AvroValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = &self.path;
        self.inner
            .next()
            .map(|item| item.map_err(|e| ConvertError::avro(path, e)))
    }
}
