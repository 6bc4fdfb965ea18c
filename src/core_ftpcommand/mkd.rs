use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::pwd::quote_path;
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory; the parent has to exist already.
pub struct MkdCommand;

#[async_trait]
impl CommandHandler for MkdCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::CreateDir)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("MKD needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        if resolved.real_path.symlink_metadata().is_ok() {
            return Ok(Reply::new(550, "Directory already exists."));
        }

        tokio::fs::create_dir(&resolved.real_path)
            .await
            .map_err(|e| CommandError::fs("Create directory", e))?;
        info!("Directory created: {:?}", resolved.real_path);
        Ok(Reply::new(
            257,
            format!("{} directory created.", quote_path(&resolved.virtual_path)),
        ))
    }
}
