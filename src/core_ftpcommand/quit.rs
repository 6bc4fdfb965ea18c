use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the QUIT FTP command. The connection loop closes the control
/// connection once the reply is out.
pub struct QuitCommand;

#[async_trait]
impl CommandHandler for QuitCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        info!("Received QUIT command from {}. Closing connection.", ctx.session.peer_addr);
        ctx.session.request_close();
        Ok(Reply::new(221, "Service closing control connection."))
    }
}
