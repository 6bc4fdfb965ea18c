use crate::core_auth::Permission;
use crate::core_ftpcommand::cwd::change_directory;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Handles the CDUP FTP command. At the virtual root it is a no-op.
pub struct CdupCommand;

#[async_trait]
impl CommandHandler for CdupCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::ChangeDir)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        if ctx.session.current_dir() == "/" {
            return Ok(Reply::new(250, "Directory successfully changed."));
        }
        change_directory(ctx.session, "..")
    }
}

#[cfg(test)]
mod tests {
    use crate::core_ftpcommand::test_support::TestHarness;

    #[tokio::test]
    async fn test_cdup_stops_at_root() {
        let mut harness = TestHarness::logged_in().await;
        std::fs::create_dir_all(harness.home().join("a/b")).unwrap();
        harness.run("CWD a/b").await;

        assert_eq!(harness.run("CDUP").await.code(), 250);
        assert_eq!(harness.session.current_dir(), "/a");
        harness.run("XCUP").await;
        assert_eq!(harness.session.current_dir(), "/");
        assert_eq!(harness.run("CDUP").await.code(), 250);
        assert_eq!(harness.session.current_dir(), "/");
    }
}
