use super::memory::InMemoryRepository;
use super::{RepoResult, RoleAssignmentReader, UserService};
use crate::error::RepositoryError;
use crate::model::{LegacyRoleRow, UserId};

/// The legacy role subsystem as seen by the listing command.
///
/// It does not share the service layer's identity: callers must `login`
/// before fetching, and reads fail until they do.
pub struct LegacyRoleGateway<'a> {
    repository: &'a InMemoryRepository,
    session: Option<UserId>,
}

impl<'a> LegacyRoleGateway<'a> {
    pub fn new(repository: &'a InMemoryRepository) -> Self {
        Self {
            repository,
            session: None,
        }
    }

    pub fn session(&self) -> Option<UserId> {
        self.session
    }
}

impl RoleAssignmentReader for LegacyRoleGateway<'_> {
    fn login(&mut self, user: UserId) -> RepoResult<()> {
        let user = self.repository.load_user(user)?;
        tracing::debug!(login = %user.login, "legacy session opened");
        self.session = Some(user.id);
        Ok(())
    }

    fn fetch_by_user(&self, user: UserId) -> RepoResult<Vec<LegacyRoleRow>> {
        let Some(session) = self.session else {
            return Err(RepositoryError::Unauthorized {
                user: "anonymous".to_string(),
                module: "role".to_string(),
                function: "read".to_string(),
            });
        };
        tracing::trace!(%session, %user, "fetching legacy role rows");

        let state = self.repository.state();
        let rows = state
            .role_assignments
            .iter()
            .filter(|a| a.user_id == user)
            .map(|assignment| {
                let role_name = state
                    .roles
                    .iter()
                    .find(|r| r.id == assignment.role_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                let (limit_identifier, limit_value) = match &assignment.limitation {
                    Some(limitation) => (
                        limitation.identifier().to_string(),
                        limitation.values().join(","),
                    ),
                    None => (String::new(), String::new()),
                };
                LegacyRoleRow {
                    user_role_id: assignment.id,
                    role_name,
                    limit_identifier,
                    limit_value,
                }
            })
            .collect();
        Ok(rows)
    }
}
