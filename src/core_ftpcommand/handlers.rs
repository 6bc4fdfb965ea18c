use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::ftpcommand::{parse_command_line, FtpCommand};
use crate::core_ftpcommand::reply::{Reply, ReplyWriter};
use crate::core_ftpcommand::{
    appe, cdup, cwd, dele, feat, list, mdtm, mfmt, mkd, noop, opts, pass, pwd, quit, retr, rmd,
    rnfr, rnto, size, stor, syst, type_, user,
};
use crate::core_network::pasv;
use crate::server::ServerContext;
use crate::session::Session;
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;

/// Everything a handler may touch while serving one command.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub server: &'a ServerContext,
    /// Only for preliminary (1xx) replies; the final reply is returned.
    pub writer: &'a mut ReplyWriter,
}

impl CommandContext<'_> {
    pub async fn send_preliminary(&mut self, reply: Reply) -> Result<(), CommandError> {
        self.writer
            .send(&reply)
            .await
            .map_err(CommandError::TransferAborted)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Whether the command is refused with 530 before login.
    fn requires_login(&self) -> bool {
        true
    }

    /// Capability the logged-in user must hold.
    fn permission(&self) -> Option<Permission> {
        None
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError>;
}

pub struct CommandRegistry {
    handlers: HashMap<FtpCommand, Box<dyn CommandHandler>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: initialize_command_handlers(),
        }
    }

    pub fn supports(&self, command: FtpCommand) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Parses one control line, applies the login and permission gates and
    /// runs the matching handler. Never fails: every error becomes a reply.
    pub async fn dispatch(&self, ctx: &mut CommandContext<'_>, line: &str) -> Reply {
        let parsed = match parse_command_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("{} sent unparsable line: {}", ctx.session.peer_addr, e);
                return e.to_ftp_response();
            }
        };

        if parsed.verb == "PASS" {
            debug!("<- {} PASS ****", ctx.session.peer_addr);
        } else {
            debug!("<- {} {} {}", ctx.session.peer_addr, parsed.verb, parsed.arg);
        }

        let handler = match FtpCommand::from_verb(&parsed.verb).and_then(|c| self.handlers.get(&c))
        {
            Some(handler) => handler,
            None => return Reply::new(502, "Command not recognized."),
        };

        if let Err(e) = check_access(handler.as_ref(), ctx.session) {
            return e.to_ftp_response();
        }

        match handler.handle(ctx, parsed.arg).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    "{} {} failed: {}",
                    ctx.session.peer_addr, parsed.verb, e
                );
                e.to_ftp_response()
            }
        }
    }
}

fn check_access(handler: &dyn CommandHandler, session: &Session) -> Result<(), CommandError> {
    if !handler.requires_login() {
        return Ok(());
    }
    let user = session.user().ok_or(CommandError::NotLoggedIn)?;
    match handler.permission() {
        Some(permission) if !user.permissions().contains(permission) => {
            Err(CommandError::PermissionDenied)
        }
        _ => Ok(()),
    }
}

pub fn initialize_command_handlers() -> HashMap<FtpCommand, Box<dyn CommandHandler>> {
    let mut handlers: HashMap<FtpCommand, Box<dyn CommandHandler>> = HashMap::new();

    handlers.insert(FtpCommand::USER, Box::new(user::UserCommand));
    handlers.insert(FtpCommand::PASS, Box::new(pass::PassCommand));
    handlers.insert(FtpCommand::QUIT, Box::new(quit::QuitCommand));
    handlers.insert(FtpCommand::NOOP, Box::new(noop::NoopCommand));
    handlers.insert(FtpCommand::SYST, Box::new(syst::SystCommand));
    handlers.insert(FtpCommand::FEAT, Box::new(feat::FeatCommand));
    handlers.insert(FtpCommand::OPTS, Box::new(opts::OptsCommand));
    handlers.insert(FtpCommand::TYPE, Box::new(type_::TypeCommand));
    handlers.insert(FtpCommand::MODE, Box::new(type_::ModeCommand));
    handlers.insert(FtpCommand::STRU, Box::new(type_::StruCommand));

    handlers.insert(FtpCommand::PWD, Box::new(pwd::PwdCommand));
    handlers.insert(FtpCommand::CWD, Box::new(cwd::CwdCommand));
    handlers.insert(FtpCommand::CDUP, Box::new(cdup::CdupCommand));
    handlers.insert(FtpCommand::LIST, Box::new(list::ListCommand::long()));
    handlers.insert(FtpCommand::NLST, Box::new(list::ListCommand::names_only()));

    handlers.insert(FtpCommand::MKD, Box::new(mkd::MkdCommand));
    handlers.insert(FtpCommand::RMD, Box::new(rmd::RmdCommand));
    handlers.insert(FtpCommand::DELE, Box::new(dele::DeleCommand));
    handlers.insert(FtpCommand::RNFR, Box::new(rnfr::RnfrCommand));
    handlers.insert(FtpCommand::RNTO, Box::new(rnto::RntoCommand));
    handlers.insert(FtpCommand::SIZE, Box::new(size::SizeCommand));
    handlers.insert(FtpCommand::MDTM, Box::new(mdtm::MdtmCommand));
    handlers.insert(FtpCommand::MFMT, Box::new(mfmt::MfmtCommand));

    handlers.insert(FtpCommand::RETR, Box::new(retr::RetrCommand));
    handlers.insert(FtpCommand::STOR, Box::new(stor::StorCommand));
    handlers.insert(FtpCommand::APPE, Box::new(appe::AppeCommand));

    handlers.insert(FtpCommand::PASV, Box::new(pasv::PasvCommand));
    handlers.insert(FtpCommand::EPSV, Box::new(pasv::EpsvCommand));

    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_ftpcommand::test_support::{exists, TestHarness};
    use crate::session::SessionState;

    #[test]
    fn test_every_command_has_a_handler() {
        let registry = CommandRegistry::new();
        for verb in [
            "USER", "PASS", "QUIT", "NOOP", "SYST", "FEAT", "OPTS", "TYPE", "MODE", "STRU", "PWD",
            "CWD", "CDUP", "LIST", "NLST", "MKD", "RMD", "DELE", "RNFR", "RNTO", "SIZE", "MDTM",
            "MFMT", "RETR", "STOR", "APPE", "PASV", "EPSV",
        ] {
            let command = FtpCommand::from_verb(verb).unwrap();
            assert!(registry.supports(command), "{} has no handler", verb);
        }
    }

    #[tokio::test]
    async fn test_commands_before_login_are_rejected() {
        let mut harness = TestHarness::anonymous();
        let file = harness.write_file("keep.txt", b"x");

        for line in [
            "PWD",
            "CWD /",
            "DELE keep.txt",
            "MKD newdir",
            "PASV",
            "MFMT 20230615120000.000000 keep.txt",
        ] {
            let reply = harness.run(line).await;
            assert_eq!(reply.to_wire(), "530 Not logged in.\r\n", "{}", line);
        }

        assert!(matches!(harness.session.state(), SessionState::Unauthenticated));
        assert!(!harness.session.has_passive());
        assert!(exists(&file));
        assert!(!exists(&harness.home().join("newdir")));
    }

    #[tokio::test]
    async fn test_login_gate_keeps_awaiting_password_state() {
        let mut harness = TestHarness::anonymous();
        harness.run("USER alice").await;
        assert_eq!(harness.run("PWD").await.code(), 530);
        assert!(matches!(
            harness.session.state(),
            SessionState::AwaitingPassword { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_commands() {
        let mut harness = TestHarness::logged_in().await;
        assert_eq!(harness.run("SITE CHMOD 777 x").await.code(), 502);
        assert_eq!(harness.run("PORT 127,0,0,1,4,1").await.code(), 502);
        assert_eq!(harness.run("").await.code(), 500);
        assert_eq!(harness.run("NO-OP").await.code(), 500);
        assert_eq!(harness.run("TOOLONGVERB x").await.code(), 500);
        // The session survives all of that.
        assert_eq!(harness.run("NOOP").await.code(), 200);
        assert!(harness.session.is_logged_in());
    }

    #[tokio::test]
    async fn test_permission_gate() {
        let mut harness = TestHarness::logged_in_with_perm("el").await;
        let file = harness.write_file("f.txt", b"x");

        assert_eq!(harness.run("DELE f.txt").await.to_wire(), "550 Permission denied.\r\n");
        assert!(exists(&file));
        assert_eq!(harness.run("PWD").await.code(), 257);
    }

    #[tokio::test]
    async fn test_verbs_are_case_insensitive() {
        let mut harness = TestHarness::logged_in().await;
        assert_eq!(harness.run("noop").await.code(), 200);
        assert_eq!(harness.run("xPwD").await.code(), 257);
    }
}
