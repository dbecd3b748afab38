//! Role sets required by each protected operation.
//!
//! The HTTP layer gates routes with these before reading a body, and the
//! lifecycle engine checks them again on entry. An empty set admits any
//! active account.

use crate::Role;

pub const ANY_ROLE: &[Role] = &[];

pub const CREATE_DOCUMENT_REQUEST: &[Role] = &[Role::Student];
pub const CREATE_MAJOR_APPLICATION: &[Role] = &[Role::Student];
pub const CREATE_PETITION: &[Role] = &[Role::Instructor];

pub const UPDATE_STATUS: &[Role] = &[Role::Admin];
pub const CREATE_CALENDAR_EVENT: &[Role] = &[Role::Admin];
pub const MANAGE_USERS: &[Role] = &[Role::Admin];

/// Paying is open to every authenticated role.
pub const PAY: &[Role] = ANY_ROLE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_gates_are_disjoint_by_role() {
        for role in Role::ALL {
            let creates = [
                CREATE_DOCUMENT_REQUEST,
                CREATE_MAJOR_APPLICATION,
                CREATE_PETITION,
                CREATE_CALENDAR_EVENT,
            ]
            .iter()
            .filter(|set| set.contains(role))
            .count();
            let expected = match role {
                Role::Student => 2,
                Role::Instructor | Role::Admin => 1,
            };
            assert_eq!(creates, expected, "{role}");
        }
        assert_eq!(UPDATE_STATUS, &[Role::Admin]);
    }
}
