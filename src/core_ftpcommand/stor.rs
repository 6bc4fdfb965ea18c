use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::data;
use async_trait::async_trait;
use log::{error, info};
use tokio::fs::OpenOptions;

/// Receives a file from the data channel. `append` keeps existing content.
pub async fn receive_file(
    ctx: &mut CommandContext<'_>,
    arg: &str,
    append: bool,
) -> Result<Reply, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::InvalidArgument("a path is required".into()));
    }
    let resolved = ctx.session.resolve(arg)?;
    if resolved.real_path.is_dir() {
        return Ok(Reply::new(550, format!("{} is a directory.", resolved.virtual_path)));
    }

    // Nothing is opened, created or truncated until the client is connected.
    let mut data = data::start_transfer(ctx, "Ok to send data.").await?;

    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let mut file = options
        .open(&resolved.real_path)
        .await
        .map_err(|e| CommandError::fs("Open", e))?;

    let buffer_size = ctx.server.config.transfer_buffer_size;
    let received = data::pump(&mut data.stream, &mut file, buffer_size)
        .await
        .map_err(|e| {
            error!("Error receiving {}: {}", resolved.virtual_path, e);
            CommandError::TransferAborted(e)
        })?;

    info!(
        "File {} successfully: {} ({} bytes)",
        if append { "appended" } else { "stored" },
        resolved.virtual_path,
        received
    );
    Ok(Reply::new(226, "Transfer complete."))
}

/// Handles the STOR (Store File) FTP command, replacing any existing file.
pub struct StorCommand;

#[async_trait]
impl CommandHandler for StorCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Write)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        receive_file(ctx, arg, false).await
    }
}
