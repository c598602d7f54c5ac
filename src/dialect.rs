//! Text dialects: delimiter unescaping and sniffing.
//!
//! The [`Sniffer`] looks at a bounded sample of the first input and guesses the delimiter
//! and whether the first row is a header. Delimiter choice is by table uniformity (the
//! candidate whose rows most consistently share one field count wins); header detection
//! is a per-column vote comparing the first row against the rows below it.

use crate::error::{ConvertError, Result};
use std::collections::HashMap;

/// Number of bytes read from the first input for sniffing and header inference.
pub const SAMPLE_BYTES: usize = 16 * 1024;

/// Delimiter and header presence of a text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: false,
        }
    }
}

/// Unescape a user-supplied delimiter such as `\t` or `\x1f` into a single byte.
///
/// # Errors
/// [`ConvertError::Validation`] for unknown escapes or anything that is not exactly one
/// ASCII byte after unescaping.
pub fn unescape_delimiter(raw: &str) -> Result<u8> {
    let invalid = |why: &str| ConvertError::Validation(format!("delimiter {raw:?} {why}"));
    let unescaped: Vec<u8> = match raw.strip_prefix('\\') {
        None => raw.as_bytes().to_vec(),
        Some("t") => vec![b'\t'],
        Some("n") => vec![b'\n'],
        Some("r") => vec![b'\r'],
        Some("0") => vec![0],
        Some("\\") => vec![b'\\'],
        Some(hex) if hex.len() == 3 && hex.starts_with('x') => {
            vec![u8::from_str_radix(&hex[1..], 16).map_err(|_| invalid("has a bad hex escape"))?]
        }
        Some(_) => return Err(invalid("uses an unknown escape")),
    };
    match unescaped.as_slice() {
        [b] if b.is_ascii() => Ok(*b),
        [] => Err(invalid("is empty")),
        _ => Err(invalid("must be a single ASCII character")),
    }
}

/// Parse up to `limit` rows of `sample`, quote-aware, tolerating ragged rows.
///
/// Rows that fail to parse end the scan; a sample is a prefix, so its tail may be cut.
pub(crate) fn parse_rows(sample: &str, delimiter: u8, limit: usize) -> Vec<csv::StringRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample.as_bytes());
    rdr.records()
        .take(limit)
        .map_while(std::result::Result::ok)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Numeric,
    Length(usize),
}

fn is_numeric(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty() && cell.parse::<f64>().is_ok()
}

fn kind_of(cell: &str) -> CellKind {
    if is_numeric(cell) {
        CellKind::Numeric
    } else {
        CellKind::Length(cell.chars().count())
    }
}

/// Dialect sniffer over a text sample.
#[derive(Debug, Clone)]
pub struct Sniffer {
    candidates: Vec<u8>,
    max_rows: usize,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self {
            candidates: vec![b',', b'\t', b';', b'|', b':'],
            max_rows: 50,
        }
    }
}

impl Sniffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict or reorder the delimiters considered. Earlier candidates win ties.
    #[must_use]
    pub fn with_candidates(mut self, candidates: impl Into<Vec<u8>>) -> Self {
        self.candidates = candidates.into();
        self
    }

    /// Sniff both delimiter and header presence.
    #[must_use]
    pub fn sniff(&self, sample: &str) -> Dialect {
        let delimiter = self.sniff_delimiter(sample);
        Dialect {
            delimiter,
            has_header: self.has_header(sample, delimiter),
        }
    }

    /// The candidate whose rows most uniformly share a field count above one.
    /// Falls back to `,` when no candidate splits the sample.
    #[must_use]
    pub fn sniff_delimiter(&self, sample: &str) -> u8 {
        let mut best: Option<Uniformity> = None;
        for &candidate in &self.candidates {
            let rows = parse_rows(sample, candidate, self.max_rows);
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for row in &rows {
                *counts.entry(row.len()).or_default() += 1;
            }
            let Some((fields, agreeing)) = counts
                .into_iter()
                .max_by_key(|&(fields, agreeing)| (agreeing, fields))
            else {
                continue;
            };
            if fields < 2 {
                continue;
            }
            let score = Uniformity {
                delimiter: candidate,
                agreeing,
                total: rows.len(),
                fields,
            };
            if best.as_ref().is_none_or(|b| score.beats(b)) {
                best = Some(score);
            }
        }
        best.map_or(b',', |b| b.delimiter)
    }

    /// Vote on whether the first row of `sample` is a header.
    #[must_use]
    pub fn has_header(&self, sample: &str, delimiter: u8) -> bool {
        let rows = parse_rows(sample, delimiter, self.max_rows);
        let Some((header, body)) = rows.split_first() else {
            return false;
        };
        let body: Vec<_> = body.iter().filter(|r| r.len() == header.len()).collect();
        if body.is_empty() {
            return header
                .iter()
                .all(|cell| !cell.trim().is_empty() && !is_numeric(cell));
        }

        let mut votes: i64 = 0;
        for (column, head) in header.iter().enumerate() {
            let mut kinds = body.iter().map(|row| kind_of(&row[column]));
            let Some(first) = kinds.next() else { continue };
            if !kinds.all(|k| k == first) {
                continue;
            }
            votes += match first {
                CellKind::Numeric if is_numeric(head) => -1,
                CellKind::Numeric => 1,
                CellKind::Length(n) if head.chars().count() == n => -1,
                CellKind::Length(_) => 1,
            };
        }
        votes > 0
    }
}

struct Uniformity {
    delimiter: u8,
    agreeing: usize,
    total: usize,
    fields: usize,
}

impl Uniformity {
    // agreeing/total compared by cross-multiplication; more fields breaks ties.
    fn beats(&self, other: &Self) -> bool {
        let lhs = self.agreeing * other.total;
        let rhs = other.agreeing * self.total;
        lhs > rhs || (lhs == rhs && self.fields > other.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_tab_and_hex() {
        assert_eq!(unescape_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(unescape_delimiter("\\x1f").unwrap(), 0x1f);
        assert_eq!(unescape_delimiter(";").unwrap(), b';');
    }

    #[test]
    fn unescape_rejects_multi_char_and_unknown_escapes() {
        assert!(unescape_delimiter("ab").is_err());
        assert!(unescape_delimiter("\\q").is_err());
        assert!(unescape_delimiter("").is_err());
        assert!(unescape_delimiter("é").is_err());
    }

    #[test]
    fn quoted_delimiters_do_not_count() {
        let sample = "a;b\n\"x,y\";1\n\"z,w\";2\n";
        assert_eq!(Sniffer::new().sniff_delimiter(sample), b';');
    }
}
