//! Input path expansion.
//!
//! Command-line inputs may be literal paths or glob patterns such as `exports/*.csv`.
//! Patterns expand to the matching files in sorted order so runs are deterministic;
//! literal paths are passed through untouched and fail later, at open time, if missing.

use crate::error::{ConvertError, Result};
use glob::glob;
use std::path::PathBuf;

/// Whether `arg` contains glob metacharacters.
#[must_use]
pub fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// Expand a glob pattern into the sorted list of matching files.
///
/// Directories are skipped. An empty result is not an error here.
///
/// # Errors
/// [`ConvertError::Validation`] for a malformed pattern, [`ConvertError::Io`] when a
/// matched entry cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern)
        .map_err(|e| ConvertError::Validation(format!("invalid glob pattern {pattern:?}: {e}")))?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            ConvertError::io(path, e.into_error())
        })?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Expand every input argument, preserving argument order.
///
/// # Errors
/// [`ConvertError::Validation`] when a pattern matches no files, plus the errors of
/// [`expand_glob`].
pub fn expand_inputs<S: AsRef<str>>(args: &[S]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::with_capacity(args.len());
    for arg in args {
        let arg = arg.as_ref();
        if !is_pattern(arg) {
            inputs.push(PathBuf::from(arg));
            continue;
        }
        let matched = expand_glob(arg)?;
        if matched.is_empty() {
            return Err(ConvertError::Validation(format!(
                "no files found matching pattern: {arg}"
            )));
        }
        inputs.extend(matched);
    }
    Ok(inputs)
}
