//! Payload decoding.
//!
//! Period files are GeoJSON feature collections, served either as plain JSON
//! or pre-compressed with gzip. Compression is detected from the gzip magic
//! bytes rather than from headers, since static hosts often serve `.gz`
//! files without a `Content-Encoding`.

use std::io::Read;

use flate2::read::GzDecoder;

use super::FetchError;
use crate::geo::GeographicDataset;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `payload` starts with the gzip magic bytes.
pub fn is_gzip(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}

/// Decode a raw payload into a dataset.
pub fn decode_payload(identifier: &str, payload: &[u8]) -> Result<GeographicDataset, FetchError> {
    if is_gzip(payload) {
        let mut json = Vec::with_capacity(payload.len() * 4);
        GzDecoder::new(payload)
            .read_to_end(&mut json)
            .map_err(|e| FetchError::malformed(identifier, format!("gzip: {}", e)))?;
        return parse_json(identifier, &json);
    }
    parse_json(identifier, payload)
}

fn parse_json(identifier: &str, json: &[u8]) -> Result<GeographicDataset, FetchError> {
    serde_json::from_slice(json).map_err(|e| FetchError::malformed(identifier, e))
}
