use super::MutationOperation;
use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::{FatalError, RepositoryError};
use crate::executor::Detail;
use crate::model::{AssignmentId, Limitation, LocationId, Role, User, UserId};
use crate::output::RoleListing;
use crate::repository::{RepoResult, Repository, RoleAssignmentReader};

/// Load the user whose roles are about to change.
pub fn resolve_target_user(repository: &dyn Repository, user: UserId) -> Result<User, FatalError> {
    repository
        .users()
        .load_user(user)
        .map_err(|e| FatalError::Precondition(format!("Could not load user {user}: {e}")))
}

/// Load the role to grant. Missing roles stop the run before any change.
pub fn resolve_role(repository: &dyn Repository, identifier: &str) -> Result<Role, FatalError> {
    repository
        .roles()
        .load_role_by_identifier(identifier)
        .map_err(|e| {
            tracing::error!(identifier, error = %e, "role lookup failed");
            FatalError::Precondition(
                "Could not load Role with given identifier. No users changed.".to_string(),
            )
        })
}

/// Grant a role to one user, limited to the subtree of each location.
pub struct AssignRole {
    role: Role,
    user: User,
}

impl AssignRole {
    pub fn new(role: Role, user: User) -> Self {
        Self { role, user }
    }
}

impl MutationOperation for AssignRole {
    type Record = LocationId;

    fn name(&self) -> &'static str {
        "assign-role"
    }

    fn apply(&self, id: &LocationId, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let repository = ctx.repository();
        let location = repository.locations().load_location(*id)?;
        let limitation = Limitation::subtree(&location.path_string);
        let assignment = repository.roles().assign_role_to_user(
            ctx.identity(),
            &self.role,
            &self.user,
            Some(limitation),
        )?;
        Ok(Detail::changed(format!(
            "assigned '{}' on subtree {} (assignment {})",
            self.role.identifier, location.path_string, assignment.id
        )))
    }

    fn summary(&self, records: &[LocationId]) -> Summary {
        Summary::listing(
            &format!(
                "Roles to add for {}({}):",
                self.user.name, self.user.id
            ),
            records
                .iter()
                .map(|id| format!("{} -> {} (Subtree limitation)", self.role.identifier, id))
                .collect(),
        )
    }
}

/// Delete role-assignment rows of one user by id.
///
/// Goes through the low-level assignment store, so the role service's
/// validation does not run. A row that does not exist is a no-op.
pub struct RemoveAssignment {
    user: UserId,
}

impl RemoveAssignment {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

impl MutationOperation for RemoveAssignment {
    type Record = AssignmentId;

    fn name(&self) -> &'static str {
        "remove-role"
    }

    fn apply(&self, id: &AssignmentId, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let removed = ctx
            .repository()
            .assignment_store()
            .delete_assignment_row(*id, self.user)?;
        if removed == 0 {
            Ok(Detail::no_op(format!("no assignment {} for user {}", id, self.user)))
        } else {
            Ok(Detail::changed(format!("removed assignment {id}")))
        }
    }

    fn summary(&self, records: &[AssignmentId]) -> Summary {
        Summary::count(
            &format!("Role assignments to remove from user {}", self.user),
            records.len(),
        )
    }
}

/// Read a user's assignments through the legacy reader after logging in as `admin`.
pub fn list_assignments(
    reader: &mut dyn RoleAssignmentReader,
    admin: UserId,
    user: UserId,
) -> RepoResult<RoleListing> {
    reader.login(admin)?;
    let rows = reader.fetch_by_user(user)?;
    Ok(RoleListing { user_id: user, rows })
}
