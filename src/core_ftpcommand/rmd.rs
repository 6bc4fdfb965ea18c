use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use log::info;

/// Handles the RMD (Remove Directory) FTP command.
///
/// Only empty directories are removed. The home directory itself and the
/// current working directory cannot be removed.
pub struct RmdCommand;

#[async_trait]
impl CommandHandler for RmdCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::RemoveDir)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("RMD needs a path".into()));
        }
        let resolved = ctx.session.resolve(arg)?;
        if resolved.virtual_path == "/" || resolved.virtual_path == ctx.session.current_dir() {
            return Ok(Reply::new(550, "Can't remove this directory."));
        }
        if !resolved.real_path.is_dir() {
            return Err(CommandError::FileNotFound(resolved.virtual_path));
        }

        tokio::fs::remove_dir(&resolved.real_path)
            .await
            .map_err(|e| CommandError::fs("Remove directory", e))?;
        info!("Directory removed: {:?}", resolved.real_path);
        Ok(Reply::new(250, "Directory removed."))
    }
}

#[cfg(test)]
mod tests {
    use crate::core_ftpcommand::test_support::TestHarness;

    #[tokio::test]
    async fn test_rmd_removes_empty_directory_only() {
        let mut harness = TestHarness::logged_in().await;
        std::fs::create_dir(harness.home().join("empty")).unwrap();
        harness.write_file("full/file.txt", b"x");

        assert_eq!(harness.run("RMD empty").await.code(), 250);
        assert!(!harness.home().join("empty").exists());
        assert_eq!(harness.run("XRMD full").await.code(), 550);
        assert!(harness.home().join("full").is_dir());
        assert_eq!(harness.run("RMD /").await.code(), 550);
    }
}
