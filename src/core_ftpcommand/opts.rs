use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Handles OPTS. Only `UTF8 ON` is understood; paths are always UTF-8.
pub struct OptsCommand;

#[async_trait]
impl CommandHandler for OptsCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, _ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let parts: Vec<String> = arg
            .split_whitespace()
            .map(|s| s.to_ascii_uppercase())
            .collect();
        match parts.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["UTF8", "ON"] | ["UTF8"] => Ok(Reply::new(200, "Always in UTF8 mode.")),
            _ => Err(CommandError::InvalidArgument(arg.to_string())),
        }
    }
}
