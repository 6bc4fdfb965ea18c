use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::session::TransferType;
use async_trait::async_trait;
use log::info;

/// Handles the TYPE FTP command.
///
/// `A` and `I` (and `L 8`) are accepted. Transfers are byte-for-byte in
/// both cases; the type is only remembered for the session.
pub struct TypeCommand;

#[async_trait]
impl CommandHandler for TypeCommand {
    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let normalized = arg.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let (transfer_type, reply) = match normalized.as_str() {
            "A" | "A N" => (TransferType::Ascii, "Type set to A."),
            "I" | "L 8" => (TransferType::Binary, "Type set to I."),
            "" => return Err(CommandError::InvalidArgument("TYPE needs a type code".into())),
            _ => return Err(CommandError::UnsupportedParameter(normalized)),
        };
        info!("Transfer type set to {:?} for {}", transfer_type, ctx.session.peer_addr);
        ctx.session.transfer_type = transfer_type;
        Ok(Reply::new(200, reply))
    }
}

/// MODE. Only stream mode exists.
pub struct ModeCommand;

#[async_trait]
impl CommandHandler for ModeCommand {
    async fn handle(&self, _ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        match arg.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Reply::new(200, "Mode set to S.")),
            "" => Err(CommandError::InvalidArgument("MODE needs a mode".into())),
            other => Err(CommandError::UnsupportedParameter(other.to_string())),
        }
    }
}

/// STRU. Only file structure exists.
pub struct StruCommand;

#[async_trait]
impl CommandHandler for StruCommand {
    async fn handle(&self, _ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        match arg.trim().to_ascii_uppercase().as_str() {
            "F" => Ok(Reply::new(200, "Structure set to F.")),
            "" => Err(CommandError::InvalidArgument("STRU needs a structure".into())),
            other => Err(CommandError::UnsupportedParameter(other.to_string())),
        }
    }
}
