use std::fs;
use std::io;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::Export;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to decode export with {encoding}")]
    Decode { encoding: String },
    #[error("malformed export json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read export: {0}")]
    Io(#[from] io::Error),
}

/// Decode raw export bytes into UTF-8 using: BOM -> strict UTF-8 -> chardetng guess.
///
/// Old dumps of the site were produced by tools that wrote Windows-1251 or
/// KOI8-R as often as UTF-8.
pub fn decode_export(bytes: &[u8]) -> Result<String, ExportError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(&bytes[bom_len..], encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    if encoding == UTF_8 {
        // Invalid UTF-8 that still looks like UTF-8 is not recoverable.
        return Err(ExportError::Decode {
            encoding: encoding.name().to_string(),
        });
    }
    decode_with(bytes, encoding)
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, ExportError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(ExportError::Decode {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

pub fn parse_export(bytes: &[u8]) -> Result<Export, ExportError> {
    let text = decode_export(bytes)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn read_export(path: &Path) -> Result<Export, ExportError> {
    let bytes = fs::read(path)?;
    parse_export(&bytes)
}
