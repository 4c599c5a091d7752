//! Dataset source resolution: local files or HTTP(S) URLs.

use anyhow::{Context, Result};
use tracing::debug;

/// Fetches `url` with a blocking GET and returns the response body.
///
/// # Errors
///
/// Fails on transport errors and on non-success HTTP status codes.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned an error status"))?;
    Ok(resp.bytes()?.to_vec())
}

/// Returns `true` when `source` should be fetched over HTTP instead of read from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads raw bytes from a local file path or fetches them over HTTP.
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(source)?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read dataset file '{source}'"))?
    };
    debug!(source, bytes = bytes.len(), "Dataset source read");
    Ok(bytes)
}
