use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Quotes a virtual path for a 257 reply, doubling embedded quotes.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

/// Handles the PWD (Print Working Directory) FTP command.
///
/// Reports the virtual working directory. The real location of the home
/// directory is never shown to the client.
pub struct PwdCommand;

#[async_trait]
impl CommandHandler for PwdCommand {
    async fn handle(&self, ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        let current = quote_path(ctx.session.current_dir());
        Ok(Reply::new(257, format!("{} is the current directory.", current)))
    }
}
