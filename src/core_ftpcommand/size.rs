use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Handles the SIZE FTP command. Only regular files have a size.
pub struct SizeCommand;

#[async_trait]
impl CommandHandler for SizeCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::List)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("SIZE needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        let metadata = tokio::fs::metadata(&resolved.real_path)
            .await
            .map_err(|_| CommandError::FileNotFound(resolved.virtual_path.clone()))?;
        if !metadata.is_file() {
            return Ok(Reply::new(550, format!("{} is not a regular file.", resolved.virtual_path)));
        }
        Ok(Reply::new(213, metadata.len().to_string()))
    }
}
