//! Pre-handshake client id exchange.
//!
//! Right after accept the server writes the assigned id as a 4-byte
//! big-endian integer, before any framed message.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Write the assigned client id and flush it immediately
pub async fn write_client_id<W>(writer: &mut W, id: i32) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_i32(id).await?;
    writer.flush().await
}

/// Read the client id assigned by the server
pub async fn read_client_id<R>(reader: &mut R) -> std::io::Result<i32>
where
    R: AsyncRead + Unpin,
{
    reader.read_i32().await
}
