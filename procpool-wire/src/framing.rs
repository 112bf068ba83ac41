//! Newline-delimited JSON framing helpers.
//!
//! One object per line keeps the transport trivially compatible with
//! `AsyncBufReadExt::lines()` on the read side and a single `write_all` on
//! the write side, without pulling in a full codec crate for a protocol this
//! small.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Errors from reading or writing a single NDJSON line.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reads one message from an async buffered reader, or `Ok(None)` at EOF.
pub async fn read_line<R, T>(reader: &mut R) -> Result<Option<T>, FramingError>
where
    R: AsyncBufReadExt + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Writes one message as a single `\n`-terminated JSON line.
pub async fn write_line<W, T>(writer: &mut W, value: &T) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(value)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
