use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the RNFR (Rename From) FTP command.
///
/// Remembers the source path for the RNTO that must follow.
pub struct RnfrCommand;

#[async_trait]
impl CommandHandler for RnfrCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Rename)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("RNFR needs a path".into()));
        }
        ctx.session.rename_from = None;
        let resolved = ctx.session.resolve(arg)?;
        if resolved.virtual_path == "/" || resolved.real_path.symlink_metadata().is_err() {
            return Err(CommandError::FileNotFound(resolved.virtual_path));
        }
        info!("Rename source set to {}", resolved.virtual_path);
        ctx.session.rename_from = Some(resolved);
        Ok(Reply::new(350, "Ready for RNTO."))
    }
}
