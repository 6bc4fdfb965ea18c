use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::data;
use async_trait::async_trait;
use log::{error, info};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Handles the RETR (Retrieve) FTP command.
///
/// Streams a file to the client over the passive data channel. The file is
/// opened before the 150 reply so that a missing file is a plain 550 and
/// the data channel stays available for the next attempt.
///
/// Transfers are always byte-for-byte, regardless of TYPE.
pub struct RetrCommand;

#[async_trait]
impl CommandHandler for RetrCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Read)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("RETR needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        let metadata = tokio::fs::metadata(&resolved.real_path)
            .await
            .map_err(|_| CommandError::FileNotFound(resolved.virtual_path.clone()))?;
        if !metadata.is_file() {
            return Ok(Reply::new(550, format!("{} is not a regular file.", resolved.virtual_path)));
        }
        let mut file = File::open(&resolved.real_path)
            .await
            .map_err(|e| CommandError::fs("Open", e))?;

        let announcement = format!(
            "Opening data connection for {} ({} bytes).",
            resolved.virtual_path,
            metadata.len()
        );
        let mut data = data::start_transfer(ctx, &announcement).await?;
        let buffer_size = ctx.server.config.transfer_buffer_size;
        let sent = data::pump(&mut file, &mut data.stream, buffer_size)
            .await
            .map_err(|e| {
                error!("Error sending file to client: {}", e);
                CommandError::TransferAborted(e)
            })?;
        data.stream
            .shutdown()
            .await
            .map_err(CommandError::TransferAborted)?;

        info!("File transfer completed successfully: {} ({} bytes)", resolved.virtual_path, sent);
        Ok(Reply::new(226, "Transfer complete."))
    }
}
