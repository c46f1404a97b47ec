use once_cell::sync::Lazy;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Clients,
    Products,
    Sales,
    Goals,
    Content,
    Reports,
    Reminders,
    Teams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// How far a role's grant reaches for one (resource, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No grant at all
    Denied,
    /// Only rows whose owning agent is the requester
    Own,
    /// Every row
    All,
}

const ALL_ACTIONS: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];
const ALL_RESOURCES: [Resource; 9] = [
    Resource::Users,
    Resource::Clients,
    Resource::Products,
    Resource::Sales,
    Resource::Goals,
    Resource::Content,
    Resource::Reports,
    Resource::Reminders,
    Resource::Teams,
];

/// The permission matrix, built once at startup. Managers get the full
/// matrix; agents get their own book plus read access to shared resources.
/// Content visibility (public-or-mine, managers included) is a separate
/// predicate layered on top: see `content_visible`.
static POLICY: Lazy<HashMap<(Role, Resource, Action), Scope>> = Lazy::new(|| {
    let mut table = HashMap::new();

    for resource in ALL_RESOURCES {
        for action in ALL_ACTIONS {
            table.insert((Role::Manager, resource, action), Scope::All);
            table.insert((Role::Agent, resource, action), Scope::Denied);
        }
    }

    // Agents: full CRUD on their own records
    for resource in [
        Resource::Clients,
        Resource::Sales,
        Resource::Goals,
        Resource::Content,
        Resource::Reminders,
    ] {
        for action in ALL_ACTIONS {
            table.insert((Role::Agent, resource, action), Scope::Own);
        }
    }

    // Agents: read-only on the shared catalog and team roster
    table.insert((Role::Agent, Resource::Products, Action::Read), Scope::All);
    table.insert((Role::Agent, Resource::Teams, Action::Read), Scope::All);
    table.insert((Role::Agent, Resource::Reports, Action::Read), Scope::Own);

    table
});

/// Table lookup: what scope does this role have for the action?
pub fn scope_for(role: Role, action: Action, resource: Resource) -> Scope {
    POLICY
        .get(&(role, resource, action))
        .copied()
        .unwrap_or(Scope::Denied)
}

/// Single authorization entry point.
///
/// Ownership wins first: a user may always act on a record they own,
/// regardless of the table. Otherwise the table decides; a role with no
/// grant at all gets INSUFFICIENT_PERMISSIONS, a role scoped to its own
/// records gets ACCESS_DENIED for someone else's record.
pub fn authorize(
    user: &AuthUser,
    action: Action,
    resource: Resource,
    owner: Option<Uuid>,
) -> Result<(), ApiError> {
    if owner == Some(user.id) {
        return Ok(());
    }

    match scope_for(user.role, action, resource) {
        Scope::All => Ok(()),
        Scope::Own => Err(ApiError::access_denied(
            "You can only access your own records",
        )),
        Scope::Denied => Err(ApiError::insufficient_permissions(
            "Your role does not permit this action",
        )),
    }
}

/// Owner filter for list queries: None means unrestricted, Some(id) means
/// the query must be constrained to that agent's rows.
pub fn read_scope(user: &AuthUser, resource: Resource) -> Result<Option<Uuid>, ApiError> {
    match scope_for(user.role, Action::Read, resource) {
        Scope::All => Ok(None),
        Scope::Own => Ok(Some(user.id)),
        Scope::Denied => Err(ApiError::insufficient_permissions(
            "Your role does not permit this action",
        )),
    }
}

/// The content carve-out: visible if public or authored by the requester.
/// Holds for managers too - administrative rights do not include other
/// agents' private material.
pub fn content_visible(requester_id: Uuid, author_id: Uuid, is_public: bool) -> bool {
    is_public || author_id == requester_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "user@agency.test".to_string(),
            role,
        }
    }

    #[test]
    fn managers_have_full_matrix() {
        for resource in ALL_RESOURCES {
            for action in ALL_ACTIONS {
                assert_eq!(scope_for(Role::Manager, action, resource), Scope::All);
            }
        }
    }

    #[test]
    fn agents_cannot_manage_users() {
        let agent = auth_user(Role::Agent);
        let err = authorize(&agent, Action::Create, Resource::Users, None).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_PERMISSIONS");
    }

    #[test]
    fn agents_cannot_write_products() {
        let agent = auth_user(Role::Agent);
        assert!(authorize(&agent, Action::Read, Resource::Products, None).is_ok());
        assert!(authorize(&agent, Action::Update, Resource::Products, None).is_err());
    }

    #[test]
    fn ownership_overrides_the_table() {
        let agent = auth_user(Role::Agent);
        // Own record: allowed even where the table says Denied
        assert!(authorize(&agent, Action::Update, Resource::Users, Some(agent.id)).is_ok());
    }

    #[test]
    fn agents_denied_on_foreign_records() {
        let agent = auth_user(Role::Agent);
        let someone_else = Uuid::new_v4();
        let err =
            authorize(&agent, Action::Update, Resource::Clients, Some(someone_else)).unwrap_err();
        assert_eq!(err.error_code(), "ACCESS_DENIED");
    }

    #[test]
    fn read_scope_restricts_agents_only() {
        let manager = auth_user(Role::Manager);
        let agent = auth_user(Role::Agent);

        assert_eq!(read_scope(&manager, Resource::Sales).unwrap(), None);
        assert_eq!(read_scope(&agent, Resource::Sales).unwrap(), Some(agent.id));
        assert_eq!(read_scope(&agent, Resource::Products).unwrap(), None);
        assert!(read_scope(&agent, Resource::Users).is_err());
    }

    #[test]
    fn private_content_stays_private_from_managers() {
        let manager = auth_user(Role::Manager);
        let author = Uuid::new_v4();

        assert!(content_visible(manager.id, author, true));
        assert!(!content_visible(manager.id, author, false));
        assert!(content_visible(author, author, false));
    }
}
