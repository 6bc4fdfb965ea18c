use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the DELE (Delete File) FTP command. Directories are refused;
/// they go through RMD.
pub struct DeleCommand;

#[async_trait]
impl CommandHandler for DeleCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Delete)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("DELE needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        let metadata = tokio::fs::symlink_metadata(&resolved.real_path)
            .await
            .map_err(|_| CommandError::FileNotFound(resolved.virtual_path.clone()))?;
        if metadata.is_dir() {
            return Ok(Reply::new(550, "Is a directory."));
        }

        tokio::fs::remove_file(&resolved.real_path)
            .await
            .map_err(|e| CommandError::fs("Delete", e))?;
        info!("File deleted: {:?}", resolved.real_path);
        Ok(Reply::new(250, "File deleted."))
    }
}
