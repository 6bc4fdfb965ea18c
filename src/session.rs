use crate::core_auth::{AuthorizationStore, User};
use crate::core_ftpcommand::error::CommandError;
use crate::core_network::pasv::PassiveChannel;
use log::{info, warn};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Login progress of a control connection.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    AwaitingPassword { username: String },
    Authenticated { user: Arc<User> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// A client path mapped onto the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Normalised absolute virtual path, always starting with `/`.
    pub virtual_path: String,
    pub real_path: PathBuf,
}

/// Per-connection state. Owned by exactly one connection task.
#[derive(Debug)]
pub struct Session {
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    state: SessionState,
    current_dir: String,
    passive: Option<PassiveChannel>,
    pub rename_from: Option<ResolvedPath>,
    pub transfer_type: TransferType,
    closing: bool,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            local_addr,
            state: SessionState::Unauthenticated,
            current_dir: String::from("/"),
            passive: None,
            rename_from: None,
            transfer_type: TransferType::Ascii,
            closing: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&Arc<User>> {
        match &self.state {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user().is_some()
    }

    /// `USER`: always moves to `AwaitingPassword`, dropping any previous login.
    pub fn begin_login(&mut self, username: &str) {
        if let SessionState::Authenticated { user } = &self.state {
            info!(
                "{} logging out {} to start a new login",
                self.peer_addr,
                user.username()
            );
        }
        self.state = SessionState::AwaitingPassword {
            username: username.to_string(),
        };
        self.current_dir = String::from("/");
        self.rename_from = None;
    }

    /// `PASS`: checks the pending username against the store. Any failure
    /// drops the session back to `Unauthenticated`.
    pub fn complete_login(
        &mut self,
        store: &AuthorizationStore,
        password: &str,
    ) -> Result<Arc<User>, CommandError> {
        let username = match &self.state {
            SessionState::AwaitingPassword { username } => username.clone(),
            SessionState::Unauthenticated => {
                return Err(CommandError::BadSequence("Login with USER first.".into()))
            }
            SessionState::Authenticated { .. } => {
                return Err(CommandError::BadSequence("Already logged in.".into()))
            }
        };

        match store.authenticate(&username, password) {
            Ok(user) => {
                info!("{} authenticated as {}", self.peer_addr, username);
                self.state = SessionState::Authenticated {
                    user: Arc::clone(&user),
                };
                self.current_dir = String::from("/");
                Ok(user)
            }
            Err(e) => {
                warn!("{} failed to authenticate as {}", self.peer_addr, username);
                self.state = SessionState::Unauthenticated;
                Err(CommandError::Auth(e))
            }
        }
    }

    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    pub fn set_current_dir(&mut self, resolved: &ResolvedPath) {
        self.current_dir = resolved.virtual_path.clone();
    }

    /// Stores a freshly negotiated passive channel. A previous one is dropped,
    /// which gives its port back to the allocator.
    pub fn set_passive(&mut self, channel: PassiveChannel) {
        self.passive = Some(channel);
    }

    pub fn take_passive(&mut self) -> Option<PassiveChannel> {
        self.passive.take()
    }

    pub fn has_passive(&self) -> bool {
        self.passive.is_some()
    }

    pub fn request_close(&mut self) {
        self.closing = true;
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Resolves a client path against the working directory and the user's
    /// home. Fails with `PathEscape` when the result would leave the home.
    pub fn resolve(&self, path: &str) -> Result<ResolvedPath, CommandError> {
        let user = self.user().ok_or(CommandError::NotLoggedIn)?;
        resolve_virtual_path(user.home_dir(), &self.current_dir, path)
    }
}

/// Lexically normalises `path` relative to `cwd`. `..` above the root is an escape.
pub fn normalize_virtual_path(cwd: &str, path: &str) -> Result<String, CommandError> {
    let mut components: Vec<&str> = Vec::new();
    if !path.starts_with('/') {
        components.extend(cwd.split('/').filter(|c| !c.is_empty() && *c != "."));
    }
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(CommandError::PathEscape(path.to_string()));
                }
            }
            other => components.push(other),
        }
    }
    Ok(format!("/{}", components.join("/")))
}

pub fn resolve_virtual_path(
    home: &Path,
    cwd: &str,
    path: &str,
) -> Result<ResolvedPath, CommandError> {
    let virtual_path = normalize_virtual_path(cwd, path)?;
    let real_path = home.join(virtual_path.trim_start_matches('/'));

    // Symlinks inside the home may still point outside of it.
    let existing = if real_path.symlink_metadata().is_ok() {
        Some(real_path.as_path())
    } else {
        real_path.parent()
    };
    if let Some(existing) = existing {
        if let Ok(canonical) = existing.canonicalize() {
            if !canonical.starts_with(home) {
                return Err(CommandError::PathEscape(path.to_string()));
            }
        }
    }

    Ok(ResolvedPath {
        virtual_path,
        real_path,
    })
}
