//! UTF-8 normalization of export files before parsing.
//!
//! Exports are not always written as UTF-8. Files under the size limit are
//! decoded with the detected encoding and rewritten in place; larger files
//! are passed through untouched with a warning.

use std::fs;
use std::path::Path;

use crate::error::NormalizeError;
use crate::logs::{log_debug, log_warning};

/// What normalization did to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    /// The file was valid UTF-8 already.
    AlreadyUtf8,
    /// The file was decoded from `from` and rewritten as UTF-8.
    Converted { from: String },
    /// The file was empty or too large and was left as is.
    Skipped { size: u64 },
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings and invalid UTF-8 decode lossily.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Make sure `path` holds UTF-8 content.
///
/// Files of `limit` bytes or more, and empty files, are skipped.
pub fn normalize_file(path: &Path, limit: u64) -> Result<NormalizeOutcome, NormalizeError> {
    let size = fs::metadata(path)?.len();
    if size == 0 {
        log_warning(format!("File is empty, not converting: {}", path.display()));
        return Ok(NormalizeOutcome::Skipped { size });
    }
    if size >= limit {
        log_warning(format!(
            "File too large to convert to utf-8: {}, size: {}",
            path.display(),
            size
        ));
        return Ok(NormalizeOutcome::Skipped { size });
    }

    let bytes = fs::read(path)?;
    if std::str::from_utf8(&bytes).is_ok() {
        return Ok(NormalizeOutcome::AlreadyUtf8);
    }

    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);
    fs::write(path, content)?;
    log_debug(format!("Converted {} from {} to utf-8", path.display(), encoding));

    Ok(NormalizeOutcome::Converted { from: encoding })
}
