use thiserror::Error;

use crate::{Role, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Insufficient permissions")]
    Forbidden { required: Vec<Role>, actual: Role },
}

/// Role gate for an already-resolved user.
///
/// - No IO
/// - No panics
/// - The active check runs before the role check, so a deactivated account is
///   reported as such even when its role would qualify.
/// - An empty `required` set admits any role.
pub fn authorize(user: &User, required: &[Role]) -> Result<(), AuthzError> {
    if !user.active {
        return Err(AuthzError::AccountDisabled);
    }

    if required.is_empty() || required.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            required: required.to_vec(),
            actual: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewUser, UserProfile};
    use chrono::Utc;
    use registrar_core::UserId;

    fn user(role: Role, active: bool) -> User {
        User::provision(
            UserId::new(),
            NewUser {
                username: format!("{role}"),
                password_hash: String::new(),
                role,
                active,
                profile: UserProfile::default(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn role_membership_grants() {
        assert_eq!(authorize(&user(Role::Student, true), &[Role::Student]), Ok(()));
        assert_eq!(
            authorize(&user(Role::Admin, true), &[Role::Instructor, Role::Admin]),
            Ok(())
        );
    }

    #[test]
    fn empty_set_admits_any_active_role() {
        for role in Role::ALL {
            assert_eq!(authorize(&user(*role, true), &[]), Ok(()));
        }
    }

    #[test]
    fn cross_role_is_forbidden() {
        let err = authorize(&user(Role::Instructor, true), &[Role::Student]).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                required: vec![Role::Student],
                actual: Role::Instructor
            }
        );
        assert_eq!(err.to_string(), "Insufficient permissions");
    }

    #[test]
    fn inactive_check_precedes_role_check() {
        assert_eq!(
            authorize(&user(Role::Admin, false), &[Role::Admin]),
            Err(AuthzError::AccountDisabled)
        );
        assert_eq!(
            authorize(&user(Role::Student, false), &[Role::Admin]),
            Err(AuthzError::AccountDisabled)
        );
    }
}
