use crate::constants::MAX_VERB_LENGTH;
use crate::core_ftpcommand::error::CommandError;

#[allow(clippy::upper_case_acronyms)]
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    NOOP,
    SYST,
    FEAT,
    OPTS,
    TYPE,
    MODE,
    STRU,
    PWD,
    CWD,
    CDUP,
    LIST,
    NLST,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    MFMT,
    RETR,
    STOR,
    APPE,
    PASV,
    EPSV,
}

impl FtpCommand {
    /// Case-insensitive verb lookup. The `X*` forms are RFC 775 aliases.
    pub fn from_verb(verb: &str) -> Option<FtpCommand> {
        match verb.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "NOOP" => Some(FtpCommand::NOOP),
            "SYST" => Some(FtpCommand::SYST),
            "FEAT" => Some(FtpCommand::FEAT),
            "OPTS" => Some(FtpCommand::OPTS),
            "TYPE" => Some(FtpCommand::TYPE),
            "MODE" => Some(FtpCommand::MODE),
            "STRU" => Some(FtpCommand::STRU),
            "PWD" | "XPWD" => Some(FtpCommand::PWD),
            "CWD" | "XCWD" => Some(FtpCommand::CWD),
            "CDUP" | "XCUP" => Some(FtpCommand::CDUP),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "MKD" | "XMKD" => Some(FtpCommand::MKD),
            "RMD" | "XRMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "MDTM" => Some(FtpCommand::MDTM),
            "MFMT" => Some(FtpCommand::MFMT),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            _ => None,
        }
    }
}

/// One control-channel line split into its verb and raw argument.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub verb: String,
    pub arg: &'a str,
}

/// Splits a line at the first space. The argument is kept verbatim so that
/// paths containing spaces survive.
pub fn parse_command_line(line: &str) -> Result<CommandLine<'_>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (verb, arg) = match line.split_once(' ') {
        Some((verb, arg)) => (verb, arg),
        None => (line, ""),
    };

    if verb.is_empty()
        || verb.len() > MAX_VERB_LENGTH
        || !verb.chars().all(|c| c.is_ascii_alphabetic())
    {
        return Err(CommandError::ProtocolSyntax(line.to_string()));
    }

    Ok(CommandLine {
        verb: verb.to_ascii_uppercase(),
        arg,
    })
}
