use crate::core_auth::AuthError;
use crate::core_ftpcommand::reply::Reply;
use crate::core_network::pasv::PortError;
use std::io;
use thiserror::Error;

/// Every way a command can fail. None of these end the session; the
/// dispatcher turns them into a reply with `to_ftp_response`.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Syntax error: {0}")]
    ProtocolSyntax(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bad sequence of commands: {0}")]
    BadSequence(String),

    #[error("Parameter not supported: {0}")]
    UnsupportedParameter(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Permission denied")]
    PermissionDenied,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error("Path escapes the home directory: {0}")]
    PathEscape(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to change modification time: {0}")]
    MfmtIo(#[source] io::Error),

    #[error("{action} failed: {source}")]
    Filesystem {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("No passive data channel negotiated")]
    NoDataChannel,

    #[error("Data connection failed: {0}")]
    DataConnection(#[source] io::Error),

    #[error("Transfer aborted: {0}")]
    TransferAborted(#[source] io::Error),
}

impl CommandError {
    pub fn fs(action: &'static str, source: io::Error) -> Self {
        CommandError::Filesystem { action, source }
    }

    pub fn to_ftp_response(&self) -> Reply {
        match self {
            CommandError::ProtocolSyntax(_) => {
                Reply::new(500, "Syntax error, command unrecognized.")
            }
            CommandError::InvalidArgument(_) => {
                Reply::new(501, "Syntax error in parameters or arguments.")
            }
            CommandError::BadSequence(msg) => Reply::new(503, msg.clone()),
            CommandError::UnsupportedParameter(_) => {
                Reply::new(504, "Command not implemented for that parameter.")
            }
            CommandError::NotLoggedIn => Reply::new(530, "Not logged in."),
            CommandError::PermissionDenied => Reply::new(550, "Permission denied."),
            CommandError::Auth(AuthError::InvalidCredentials) => {
                Reply::new(530, "Login incorrect.")
            }
            CommandError::Auth(_) => {
                Reply::new(451, "Requested action aborted. Local error in processing.")
            }
            CommandError::Port(PortError::NoPortAvailable { .. }) => Reply::new(
                425,
                "Can't open data connection: no passive port available.",
            ),
            CommandError::Port(_) => Reply::new(425, "Can't open data connection."),
            CommandError::MalformedTimestamp(_) => Reply::new(
                550,
                "Invalid parameter format. Correct format: MFMT <YYYYMMDDhhmmss.ffffff> <filepath>",
            ),
            // Escapes are reported exactly like missing files.
            CommandError::PathEscape(_) | CommandError::FileNotFound(_) => {
                Reply::new(550, "File not found")
            }
            CommandError::MfmtIo(e) => Reply::new(550, format!("Error: {}", e)),
            CommandError::Filesystem { action, source } => match source.kind() {
                io::ErrorKind::NotFound => Reply::new(550, "File not found"),
                io::ErrorKind::PermissionDenied => Reply::new(550, "Permission denied."),
                _ => Reply::new(550, format!("{} failed: {}", action, source)),
            },
            CommandError::NoDataChannel => Reply::new(425, "Use PASV or EPSV first."),
            CommandError::DataConnection(_) => Reply::new(425, "Can't open data connection."),
            CommandError::TransferAborted(_) => {
                Reply::new(426, "Connection closed; transfer aborted.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_error_is_generic() {
        let reply = CommandError::Auth(AuthError::InvalidCredentials).to_ftp_response();
        assert_eq!(reply, Reply::new(530, "Login incorrect."));
    }

    #[test]
    fn test_path_escape_looks_like_missing_file() {
        let escape = CommandError::PathEscape("/../etc".into()).to_ftp_response();
        let missing = CommandError::FileNotFound("/nope.txt".into()).to_ftp_response();
        assert_eq!(escape, missing);
        assert_eq!(escape.code(), 550);
    }

    #[test]
    fn test_response_classes() {
        assert_eq!(
            CommandError::ProtocolSyntax("x".into()).to_ftp_response().code(),
            500
        );
        assert_eq!(
            CommandError::MalformedTimestamp("bad".into())
                .to_ftp_response()
                .code(),
            550
        );
        assert_eq!(
            CommandError::Port(PortError::NoPortAvailable {
                low: 1000,
                high: 1001
            })
            .to_ftp_response()
            .code(),
            425
        );
        let io_reply = CommandError::MfmtIo(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            .to_ftp_response();
        assert_eq!(io_reply.text(), "Error: disk on fire");
    }
}
