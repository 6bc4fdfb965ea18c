// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[A-Za-z0-9_.@-]{1,64}$";

/// Every pyftpdlib-style permission letter the server understands.
pub const DEFAULT_PERMISSIONS: &str = "elradfmwMT";

pub const DEFAULT_GREETING: &str = "mfmt-ftpd ready.";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 64 * 1024;

pub const MAX_COMMAND_LENGTH: usize = 512;
pub const MAX_VERB_LENGTH: usize = 4;

pub const MFMT_TIMESTAMP_DIGITS: usize = 14;
pub const MFMT_MAX_FRACTION_DIGITS: usize = 6;
