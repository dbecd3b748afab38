//! `registrar-auth`: identity, session tokens and access control.
//!
//! This crate is intentionally decoupled from HTTP and storage: users are
//! looked up through the [`UserDirectory`] trait and the HTTP layer decides
//! how each error is reported.

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod identity;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use directory::{DirectoryError, UserDirectory};
pub use identity::{AuthError, Identity, Session};
pub use password::{CredentialHasher, Sha256CredentialHasher};
pub use roles::Role;
pub use token::{TokenError, TokenService, DEFAULT_TOKEN_TTL};
pub use user::{NewUser, User, UserProfile};
