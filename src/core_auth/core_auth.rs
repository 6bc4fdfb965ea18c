use crate::core_auth::error::AuthError;
use crate::core_auth::permissions::Permissions;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// An account known to the server. Immutable once registered.
#[derive(Debug, Clone)]
pub struct User {
    username: String,
    password: String,
    home_dir: PathBuf,
    permissions: Permissions,
}

impl User {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Canonical home directory; every virtual path of this user resolves below it.
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    fn password_matches(&self, candidate: &str) -> bool {
        let expected = self.password.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Process-wide username -> account table shared by every session.
#[derive(Debug, Default)]
pub struct AuthorizationStore {
    users: Mutex<HashMap<String, Arc<User>>>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `username`, replacing any earlier entry with the same name.
    ///
    /// The home directory is created (recursively) when missing, then stored
    /// in canonical form.
    pub fn add_user(
        &self,
        username: &str,
        password: &str,
        home_dir: &Path,
        permissions: Permissions,
    ) -> Result<(), AuthError> {
        if !home_dir.exists() {
            std::fs::create_dir_all(home_dir).map_err(|source| AuthError::HomeDirectory {
                path: home_dir.to_path_buf(),
                source,
            })?;
            info!("Created user directory: {}", home_dir.display());
        }
        let home_dir = home_dir
            .canonicalize()
            .map_err(|source| AuthError::HomeDirectory {
                path: home_dir.to_path_buf(),
                source,
            })?;

        let user = Arc::new(User {
            username: username.to_string(),
            password: password.to_string(),
            home_dir,
            permissions,
        });

        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if users.insert(username.to_string(), Arc::clone(&user)).is_some() {
            warn!("User {} was already registered, replacing it", username);
        }
        debug!(
            "Added user {} with home {} and permissions [{}]",
            username,
            user.home_dir.display(),
            user.permissions
        );
        Ok(())
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Arc<User>, AuthError> {
        let user = self.lookup(username).ok_or(AuthError::InvalidCredentials)?;
        if user.password_matches(password) {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn permissions_of(&self, username: &str) -> Option<Permissions> {
        self.lookup(username).map(|user| user.permissions.clone())
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, username: &str) -> Option<Arc<User>> {
        self.users
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(username)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_auth::permissions::Permission;
    use tempfile::TempDir;

    fn store_with_alice(root: &TempDir) -> AuthorizationStore {
        let store = AuthorizationStore::new();
        store
            .add_user(
                "alice",
                "secret",
                &root.path().join("alice"),
                Permissions::parse("elradfmwMT").unwrap(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_authenticate_success() {
        let root = TempDir::new().unwrap();
        let store = store_with_alice(&root);
        let user = store.authenticate("alice", "secret").unwrap();
        assert_eq!(user.username(), "alice");
        assert!(user.home_dir().is_dir());
    }

    #[test]
    fn test_wrong_password_and_unknown_user_look_the_same() {
        let root = TempDir::new().unwrap();
        let store = store_with_alice(&root);

        let wrong = store.authenticate("alice", "nope").unwrap_err();
        let unknown = store.authenticate("mallory", "secret").unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn test_password_is_compared_exactly() {
        let root = TempDir::new().unwrap();
        let store = store_with_alice(&root);
        assert!(store.authenticate("alice", "Secret").is_err());
        assert!(store.authenticate("alice", "secret ").is_err());
        assert!(store.authenticate("alice", "").is_err());
    }

    #[test]
    fn test_home_directory_created_idempotently() {
        let root = TempDir::new().unwrap();
        let home = root.path().join("nested").join("bob");
        let store = AuthorizationStore::new();
        store
            .add_user("bob", "pw", &home, Permissions::default())
            .unwrap();
        assert!(home.is_dir());
        // Second registration with the directory already present.
        store
            .add_user("bob", "pw", &home, Permissions::default())
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_username_last_wins() {
        let root = TempDir::new().unwrap();
        let store = store_with_alice(&root);
        store
            .add_user(
                "alice",
                "other",
                &root.path().join("alice2"),
                Permissions::parse("elr").unwrap(),
            )
            .unwrap();

        assert!(store.authenticate("alice", "secret").is_err());
        let user = store.authenticate("alice", "other").unwrap();
        assert!(user.home_dir().ends_with("alice2"));

        let perms = store.permissions_of("alice").unwrap();
        assert!(perms.contains(Permission::Read));
        assert!(!perms.contains(Permission::ChangeMtime));
    }

    #[test]
    fn test_permissions_of_unknown_user() {
        let store = AuthorizationStore::new();
        assert!(store.permissions_of("ghost").is_none());
        assert!(store.is_empty());
    }
}
