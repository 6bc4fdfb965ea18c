// Authorization store errors
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user or wrong password. The two cases are deliberately merged.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unknown permission letter: {0:?}")]
    UnknownPermission(char),

    #[error("Failed to prepare home directory {path:?}: {source}")]
    HomeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
