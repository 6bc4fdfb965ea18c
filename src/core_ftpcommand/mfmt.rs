use crate::constants::{MFMT_MAX_FRACTION_DIGITS, MFMT_TIMESTAMP_DIGITS};
use crate::core_auth::Permission;
use crate::core_ftpcommand::error::CommandError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandHandler};
use crate::core_ftpcommand::reply::Reply;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Offset, TimeZone};
use filetime::{set_file_times, FileTime};
use log::info;
use std::io::ErrorKind;

/// A parsed `MFMT <YYYYMMDDhhmmss.ffffff> <path>` argument.
///
/// The raw strings are kept because the success reply echoes exactly what
/// the client sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfmtRequest<'a> {
    pub timestamp: NaiveDateTime,
    pub raw_timestamp: &'a str,
    pub path: &'a str,
}

impl<'a> MfmtRequest<'a> {
    /// Splits off the timestamp token and parses it. The path is everything
    /// after the first space and may itself contain spaces.
    pub fn parse(arg: &'a str) -> Result<Self, CommandError> {
        let (raw_timestamp, path) = match arg.split_once(' ') {
            Some((timestamp, path)) => (timestamp, path),
            None => (arg, ""),
        };
        let timestamp = parse_timestamp(raw_timestamp)?;
        if path.is_empty() {
            return Err(CommandError::InvalidArgument("MFMT needs a path".into()));
        }
        Ok(Self {
            timestamp,
            raw_timestamp,
            path,
        })
    }
}

/// Parses `YYYYMMDDhhmmss.ffffff` strictly. The fraction carries one to six
/// digits and is read as a decimal fraction of a second.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CommandError> {
    let malformed = || CommandError::MalformedTimestamp(raw.to_string());

    let (digits, fraction) = raw.split_once('.').ok_or_else(malformed)?;
    if digits.len() != MFMT_TIMESTAMP_DIGITS
        || fraction.is_empty()
        || fraction.len() > MFMT_MAX_FRACTION_DIGITS
        || !digits.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32, CommandError> {
        digits[range].parse().map_err(|_| malformed())
    };
    let year = digits[0..4].parse::<i32>().map_err(|_| malformed())?;
    if year < 1 {
        return Err(malformed());
    }
    let micros = format!("{:0<width$}", fraction, width = MFMT_MAX_FRACTION_DIGITS)
        .parse::<u32>()
        .map_err(|_| malformed())?;

    let (month, day) = (field(4..6)?, field(6..8)?);
    let (hour, minute, second) = (field(8..10)?, field(10..12)?, field(12..14)?);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_micro_opt(hour, minute, second, micros))
        .ok_or_else(malformed)
}

/// How far back to look for the offset in force before a DST gap.
const GAP_LOOKBACK_HOURS: i64 = 48;

/// Maps a civil time onto an instant in `tz`. Ambiguous times take the
/// earlier instant. Times skipped by a forward transition use the offset
/// in force just before it, so 02:30 on a spring-forward night lands one
/// hour after 01:30.
pub fn resolve_local_time<Tz: TimeZone>(tz: &Tz, timestamp: &NaiveDateTime) -> Option<DateTime<Tz>> {
    if let Some(resolved) = tz.from_local_datetime(timestamp).earliest() {
        return Some(resolved);
    }
    (1..=GAP_LOOKBACK_HOURS).find_map(|hours| {
        let earlier = timestamp.checked_sub_signed(Duration::hours(hours))?;
        let offset = tz.from_local_datetime(&earlier).earliest()?.offset().fix();
        let utc = timestamp
            .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
        Some(tz.from_utc_datetime(&utc))
    })
}

/// Interprets a civil timestamp in the server's local time zone.
fn to_file_time(timestamp: &NaiveDateTime, raw: &str) -> Result<FileTime, CommandError> {
    let local = resolve_local_time(&Local, timestamp)
        .ok_or_else(|| CommandError::MalformedTimestamp(raw.to_string()))?;
    Ok(FileTime::from_unix_time(
        local.timestamp(),
        local.timestamp_subsec_nanos(),
    ))
}

/// Handles the MFMT FTP command.
///
/// Sets both the access and the modification time of an existing file and
/// answers `213 Modify Time=<timestamp>; <path>`. Never creates files.
pub struct MfmtCommand;

#[async_trait]
impl CommandHandler for MfmtCommand {
    fn permission(&self) -> Option<Permission> {
        Some(Permission::ChangeMtime)
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, arg: &str) -> Result<Reply, CommandError> {
        let request = MfmtRequest::parse(arg)?;
        let resolved = ctx.session.resolve(request.path)?;

        std::fs::metadata(&resolved.real_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CommandError::FileNotFound(resolved.virtual_path.clone()),
            _ => CommandError::MfmtIo(e),
        })?;

        let file_time = to_file_time(&request.timestamp, request.raw_timestamp)?;
        set_file_times(&resolved.real_path, file_time, file_time).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CommandError::FileNotFound(resolved.virtual_path.clone()),
            _ => CommandError::MfmtIo(e),
        })?;

        info!(
            "MFMT set {} to {} for user {}",
            resolved.virtual_path,
            request.timestamp,
            ctx.session.user().map(|u| u.username()).unwrap_or("-")
        );
        Ok(Reply::new(
            213,
            format!("Modify Time={}; {}", request.raw_timestamp, request.path),
        ))
    }
}
