//! Response body decoding.
//!
//! Only `gzip` is decoded. Anything else is treated as opaque bytes and
//! rewritten as-is.

use std::io::Read;

use axum::http::{header, HeaderMap};
use flate2::read::MultiGzDecoder;

use crate::error::TransportError;

/// How the upstream body is encoded, as far as rewriting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Gzip,
    Raw,
}

impl BodyEncoding {
    /// Inspect `Content-Encoding`. Only a single `gzip` coding counts.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
        {
            Some(value) if value.trim().eq_ignore_ascii_case("gzip") => BodyEncoding::Gzip,
            _ => BodyEncoding::Raw,
        }
    }
}

/// Decompress a complete gzip body, enforcing `limit` on the output size.
pub fn gunzip(compressed: &[u8], limit: Option<usize>) -> Result<Vec<u8>, TransportError> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }

    let decoder = MultiGzDecoder::new(compressed);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(2));
    match limit {
        Some(limit) => {
            // Read one byte past the limit to tell "exactly full" from "too large".
            decoder
                .take((limit as u64).saturating_add(1))
                .read_to_end(&mut out)
                .map_err(TransportError::Decode)?;
            if out.len() > limit {
                return Err(TransportError::BodyTooLarge { limit });
            }
        }
        None => {
            let mut decoder = decoder;
            decoder.read_to_end(&mut out).map_err(TransportError::Decode)?;
        }
    }
    Ok(out)
}
