use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::stor::receive_file;
use async_trait::async_trait;

/// Handles APPE. Like STOR, but data is added to the end of the file.
pub struct AppeCommand;

#[async_trait]
impl CommandHandler for AppeCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::Append)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        receive_file(ctx, arg, true).await
    }
}
