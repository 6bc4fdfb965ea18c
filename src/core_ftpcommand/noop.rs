use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

pub struct NoopCommand;

#[async_trait]
impl CommandHandler for NoopCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, _ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        Ok(Reply::new(200, "OK, n00p n00p !"))
    }
}
