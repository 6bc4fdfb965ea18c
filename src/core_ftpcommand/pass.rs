use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

/// Handles the PASS FTP command.
///
/// Completes the login started by USER. Unknown users and wrong passwords
/// get the same 530 reply, and the client has to start over with USER.
pub struct PassCommand;

#[async_trait]
impl CommandHandler for PassCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        ctx.session.complete_login(&ctx.server.auth, arg)?;
        Ok(Reply::new(230, "User logged in, proceed."))
    }
}

#[cfg(test)]
mod tests {
    use crate::core_ftpcommand::test_support::{TestHarness, PASSWORD, USERNAME};
    use crate::session::SessionState;

    #[tokio::test]
    async fn test_successful_login() {
        let mut harness = TestHarness::anonymous();
        harness.run(&format!("USER {}", USERNAME)).await;
        let reply = harness.run(&format!("PASS {}", PASSWORD)).await;
        assert_eq!(reply.code(), 230);
        assert!(harness.session.is_logged_in());
    }

    #[tokio::test]
    async fn test_bad_password_and_unknown_user_are_indistinguishable() {
        let mut harness = TestHarness::anonymous();
        harness.run(&format!("USER {}", USERNAME)).await;
        let wrong_password = harness.run("PASS wrong").await;
        assert!(matches!(harness.session.state(), SessionState::Unauthenticated));

        harness.run("USER mallory").await;
        let unknown_user = harness.run(&format!("PASS {}", PASSWORD)).await;

        assert_eq!(wrong_password.code(), 530);
        assert_eq!(wrong_password, unknown_user);
    }

    #[tokio::test]
    async fn test_pass_without_user() {
        let mut harness = TestHarness::anonymous();
        let reply = harness.run(&format!("PASS {}", PASSWORD)).await;
        assert_eq!(reply.code(), 503);
        assert!(!harness.session.is_logged_in());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let mut harness = TestHarness::anonymous();
        harness.run(&format!("USER {}", USERNAME)).await;
        assert_eq!(harness.run("PASS nope").await.code(), 530);
        // Retrying PASS alone is out of sequence.
        assert_eq!(harness.run(&format!("PASS {}", PASSWORD)).await.code(), 503);
        harness.run(&format!("USER {}", USERNAME)).await;
        assert_eq!(harness.run(&format!("PASS {}", PASSWORD)).await.code(), 230);
    }
}
