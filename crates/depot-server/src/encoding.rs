//! Transport compression: deciding when to gzip and producing the body stream.

use async_compression::tokio::bufread::GzipEncoder;
use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use tokio::io::AsyncBufRead;
use tokio_util::io::ReaderStream;

use crate::config::CompressionConfig;

/// Chunk size used when forwarding object bytes to the client.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Leading bytes of container formats that gain nothing from gzip.
const COMPRESSED_SIGNATURES: &[&[u8]] = &[
    &[0x1f, 0x8b],                         // gzip
    &[0x50, 0x4b, 0x03, 0x04],             // zip
    &[0x50, 0x4b, 0x05, 0x06],             // zip (empty archive)
    &[0x28, 0xb5, 0x2f, 0xfd],             // zstd
    &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00], // xz
    &[0x42, 0x5a, 0x68],                   // bzip2
    &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c], // 7z
];

/// Decides whether a response body is gzip-encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportEncoder {
    enabled: bool,
    min_size: u64,
    skip_precompressed: bool,
}

impl TransportEncoder {
    pub fn new(config: &CompressionConfig) -> Self {
        Self {
            enabled: config.enable_gzip,
            min_size: config.min_size,
            skip_precompressed: config.skip_precompressed,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Compress iff enabled, the client accepts gzip, and `body_len` reaches
    /// the threshold. `prefix` is the start of the body about to be sent and
    /// is only consulted to skip already-compressed payloads.
    pub fn should_compress(&self, client_accepts_gzip: bool, body_len: u64, prefix: &[u8]) -> bool {
        self.enabled
            && client_accepts_gzip
            && body_len >= self.min_size
            && !(self.skip_precompressed && looks_precompressed(prefix))
    }
}

/// Whether an `Accept-Encoding` value allows gzip.
///
/// `gzip` and `x-gzip` count unless explicitly refused with `q=0`.
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    accept_encoding.split(',').any(|item| {
        let mut parts = item.split(';');
        let coding = parts.next().unwrap_or_default().trim();
        if !coding.eq_ignore_ascii_case("gzip") && !coding.eq_ignore_ascii_case("x-gzip") {
            return false;
        }
        !parts.any(quality_is_zero)
    })
}

fn quality_is_zero(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q") && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
}

/// Whether `prefix` starts with a known compressed-container signature.
pub fn looks_precompressed(prefix: &[u8]) -> bool {
    COMPRESSED_SIGNATURES.iter().any(|sig| prefix.starts_with(sig))
}

/// Turn a bounded reader into a streaming response body, optionally gzipped.
///
/// Nothing is buffered beyond one chunk. Dropping the body (client gone)
/// drops the reader and with it the open store stream.
pub fn body_stream<R>(reader: R, gzip: bool) -> Body
where
    R: AsyncBufRead + Send + 'static,
{
    if gzip {
        logged_body(ReaderStream::with_capacity(
            GzipEncoder::new(reader),
            STREAM_CHUNK_SIZE,
        ))
    } else {
        logged_body(ReaderStream::with_capacity(reader, STREAM_CHUNK_SIZE))
    }
}

fn logged_body<S>(stream: S) -> Body
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
{
    Body::from_stream(stream.inspect_err(|e| {
        tracing::error!(error = %e, "object stream aborted mid-transfer");
    }))
}
