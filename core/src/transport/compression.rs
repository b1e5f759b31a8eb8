//! Byte-stream compression used for viewer payloads

use crate::error::EchoError;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Reversible compression of UTF-8 text
#[async_trait]
pub trait CompressionService: Send + Sync {
    async fn compress(&self, text: &str) -> Result<Vec<u8>, EchoError>;
    async fn decompress(&self, bytes: &[u8]) -> Result<String, EchoError>;
}

/// Gzip, matching the browser's `CompressionStream('gzip')`
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCompression;

#[async_trait]
impl CompressionService for GzipCompression {
    async fn compress(&self, text: &str) -> Result<Vec<u8>, EchoError> {
        let input = text.to_owned();
        tokio::task::spawn_blocking(move || gzip(input.as_bytes()))
            .await
            .map_err(|e| EchoError::Compression(std::io::Error::other(e)))?
            .map_err(EchoError::Compression)
    }

    async fn decompress(&self, bytes: &[u8]) -> Result<String, EchoError> {
        let input = bytes.to_vec();
        tokio::task::spawn_blocking(move || gunzip(&input))
            .await
            .map_err(|e| EchoError::Compression(std::io::Error::other(e)))?
            .map_err(EchoError::Compression)
    }
}

pub fn gzip(input: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    encoder.finish()
}

/// Inflate a gzip stream that must hold UTF-8 text
pub fn gunzip(input: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(input);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}
