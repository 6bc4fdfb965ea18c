use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use crate::session::Session;
use async_trait::async_trait;
use log::{info, warn};

/// Moves the session into `target` if it names a directory inside the home.
pub fn change_directory(session: &mut Session, target: &str) -> Result<Reply, CommandError> {
    let resolved = session.resolve(target)?;
    if !resolved.real_path.is_dir() {
        warn!("CWD target is not a directory: {}", resolved.virtual_path);
        return Ok(Reply::new(550, "Failed to change directory."));
    }
    info!("Changed directory to {}", resolved.virtual_path);
    session.set_current_dir(&resolved);
    Ok(Reply::new(250, "Directory successfully changed."))
}

/// Handles the CWD (Change Working Directory) FTP command.
pub struct CwdCommand;

#[async_trait]
impl CommandHandler for CwdCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::ChangeDir)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        if arg.is_empty() {
            return Err(CommandError::InvalidArgument("CWD needs a path".into()));
        }
        change_directory(ctx.session, arg)
    }
}

#[cfg(test)]
mod tests {
    use crate::core_ftpcommand::test_support::TestHarness;

    #[tokio::test]
    async fn test_cwd_into_subdirectory_and_back() {
        let mut harness = TestHarness::logged_in().await;
        std::fs::create_dir(harness.home().join("docs")).unwrap();

        assert_eq!(harness.run("CWD docs").await.code(), 250);
        assert_eq!(harness.session.current_dir(), "/docs");
        assert_eq!(harness.run("XCWD /").await.code(), 250);
        assert_eq!(harness.session.current_dir(), "/");
    }

    #[tokio::test]
    async fn test_cwd_refuses_files_missing_dirs_and_escapes() {
        let mut harness = TestHarness::logged_in().await;
        harness.write_file("plain.txt", b"x");

        assert_eq!(harness.run("CWD plain.txt").await.code(), 550);
        assert_eq!(harness.run("CWD missing").await.code(), 550);
        assert_eq!(harness.run("CWD ../..").await.code(), 550);
        assert_eq!(harness.session.current_dir(), "/");
    }

    #[tokio::test]
    async fn test_cwd_needs_permission() {
        let mut harness = TestHarness::logged_in_with_perm("lr").await;
        std::fs::create_dir(harness.home().join("docs")).unwrap();
        assert_eq!(harness.run("CWD docs").await.code(), 550);
        assert_eq!(harness.session.current_dir(), "/");
    }
}
