pub mod core_auth;
pub mod error;
pub mod permissions;

pub use core_auth::{AuthorizationStore, User};
pub use error::AuthError;
pub use permissions::{Permission, Permissions};
