use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;

const FEATURES: &[&str] = &["EPSV", "MDTM", "MFMT", "PASV", "SIZE", "UTF8"];

/// Handles the FEAT (Feature) FTP command.
///
/// Responds with the list of supported extensions, MFMT included.
pub struct FeatCommand;

#[async_trait]
impl CommandHandler for FeatCommand {
    fn requires_login(&self) -> bool {
        false
    }

    async fn handle(&self, _ctx: &mut CommandContext<'_>, _arg: &str) -> Result<Reply, CommandError> {
        let mut lines = vec![String::from("Features:")];
        lines.extend(FEATURES.iter().map(|f| f.to_string()));
        lines.push(String::from("End"));
        Ok(Reply::multiline(211, lines))
    }
}

#[cfg(test)]
mod tests {
    use crate::core_ftpcommand::test_support::TestHarness;

    #[tokio::test]
    async fn test_feat_advertises_mfmt_before_login() {
        let mut harness = TestHarness::anonymous();
        let reply = harness.run("FEAT").await;
        assert_eq!(reply.code(), 211);
        assert!(reply.to_wire().contains("\r\n MFMT\r\n"));
        assert!(reply.to_wire().ends_with("211 End\r\n"));
    }
}
