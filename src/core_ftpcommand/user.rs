use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the USER FTP command.
///
/// Records the username and asks for the password. Whether the user exists
/// is not revealed here; that is only decided by PASS.
pub struct UserCommand;

#[async_trait]
impl CommandHandler for UserCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let username = arg.trim();
        if username.is_empty() {
            return Err(CommandError::InvalidArgument("USER needs a name".into()));
        }
        info!("Received USER command with username: {}", username);
        ctx.session.begin_login(username);
        Ok(Reply::new(331, "User name okay, need password."))
    }
}
