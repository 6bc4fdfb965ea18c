use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Handles the SYST (System) FTP command.
///
/// Always answers "UNIX Type: L8", which is what clients expect for the
/// listing format this server produces.
pub struct SystCommand;

#[async_trait]
impl CommandHandler for SystCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, _ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        Ok(Reply::new(215, "UNIX Type: L8"))
    }
}
