use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the RNTO (Rename To) FTP command.
///
/// Only valid right after a successful RNFR. The pending source is consumed
/// whether or not the rename succeeds.
pub struct RntoCommand;

#[async_trait]
impl CommandHandler for RntoCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Rename)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let source = ctx
            .session
            .rename_from
            .take()
            .ok_or_else(|| CommandError::BadSequence("RNFR required first.".into()))?;
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("RNTO needs a path".into()));
        }
        let target = ctx.session.resolve(arg)?;
        if target.virtual_path == "/" {
            return Ok(Reply::new(550, "Can't rename onto the home directory."));
        }

        tokio::fs::rename(&source.real_path, &target.real_path)
            .await
            .map_err(|e| CommandError::fs("Rename", e))?;
        info!("Renamed {} to {}", source.virtual_path, target.virtual_path);
        Ok(Reply::new(250, "Rename successful."))
    }
}
