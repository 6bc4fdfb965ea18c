use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::CommandContext;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::pasv::DataConnection;
use log::{debug, error};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Claims the session's passive channel, announces the transfer with a 150
/// reply and waits for the client to connect.
pub async fn start_transfer(
    ctx: &mut CommandContext<'_>,
    announcement: &str,
) -> Result<DataConnection, CommandError> {
    let channel = ctx
        .session
        .take_passive()
        .ok_or(CommandError::NoDataChannel)?;
    ctx.send_preliminary(Reply::new(150, announcement)).await?;
    let wait = ctx.server.config.data_timeout();
    channel.accept(wait).await.map_err(|e| {
        error!("Failed to accept data connection: {}", e);
        CommandError::DataConnection(e)
    })
}

/// Copies `reader` into `writer` until EOF using a buffer of `buffer_size` bytes.
pub async fn pump<R, W>(reader: &mut R, writer: &mut W, buffer_size: usize) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read]).await?;
        total += bytes_read as u64;
    }
    writer.flush().await?;
    debug!("Pumped {} bytes", total);
    Ok(total)
}

/// Sends `payload` on the data connection and closes it.
pub async fn send_bytes(data: &mut DataConnection, payload: &[u8]) -> std::io::Result<()> {
    data.stream.write_all(payload).await?;
    data.stream.shutdown().await
}
