use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use chrono::DateTime;
use filetime::FileTime;
use log::info;

/// Handles the MDTM FTP command.
///
/// Reports the modification time of a file as `YYYYMMDDhhmmss` in UTC.
/// Setting times is MFMT's job.
pub struct MdtmCommand;

#[async_trait]
impl CommandHandler for MdtmCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::List)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("MDTM needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        info!("Received MDTM command for file: {}", resolved.virtual_path);

        let metadata = tokio::fs::metadata(&resolved.real_path)
            .await
            .map_err(|_| CommandError::FileNotFound(resolved.virtual_path.clone()))?;
        let modified = FileTime::from_last_modification_time(&metadata);
        let modified = DateTime::from_timestamp(modified.unix_seconds(), 0)
            .ok_or_else(|| CommandError::FileNotFound(resolved.virtual_path.clone()))?;
        Ok(Reply::new(213, modified.format("%Y%m%d%H%M%S").to_string()))
    }
}
