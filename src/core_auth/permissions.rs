use crate::core_auth::error::AuthError;
use std::collections::BTreeSet;
use std::fmt;

/// A single capability a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    ChangeDir,
    List,
    Read,
    Append,
    Delete,
    RemoveDir,
    Rename,
    CreateDir,
    Write,
    Chmod,
    ChangeMtime,
}

impl Permission {
    /// Maps one pyftpdlib permission letter to the capabilities it grants.
    /// `d` covers both file deletion and directory removal.
    fn from_letter(letter: char) -> Option<&'static [Permission]> {
        let granted: &'static [Permission] = match letter {
            'e' => &[Permission::ChangeDir],
            'l' => &[Permission::List],
            'r' => &[Permission::Read],
            'a' => &[Permission::Append],
            'd' => &[Permission::Delete, Permission::RemoveDir],
            'f' => &[Permission::Rename],
            'm' => &[Permission::CreateDir],
            'w' => &[Permission::Write],
            'M' => &[Permission::Chmod],
            'T' => &[Permission::ChangeMtime],
            _ => return None,
        };
        Some(granted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(BTreeSet<Permission>);

impl Permissions {
    pub fn parse(letters: &str) -> Result<Self, AuthError> {
        let mut set = BTreeSet::new();
        for letter in letters.chars() {
            let granted = Permission::from_letter(letter)
                .ok_or(AuthError::UnknownPermission(letter))?;
            set.extend(granted.iter().copied());
        }
        Ok(Self(set))
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|p| format!("{:?}", p)).collect();
        write!(f, "{}", names.join(","))
    }
}
