use crate::error::FatalError;
use crate::model::{Identity, UserId};
use crate::repository::Repository;

/// Who is acting, and against which repository.
///
/// Built once before the batch starts and shared read-only by every record.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    identity: &'a Identity,
    repository: &'a dyn Repository,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(identity: &'a Identity, repository: &'a dyn Repository) -> Self {
        Self {
            identity,
            repository,
        }
    }

    /// Resolve the acting user against the repository.
    pub fn bootstrap(repository: &dyn Repository, acting_user: UserId) -> Result<Identity, FatalError> {
        let user = repository.users().load_user(acting_user).map_err(|e| {
            FatalError::Precondition(format!("Could not load acting user {acting_user}: {e}"))
        })?;
        tracing::info!(login = %user.login, user_id = %user.id, "acting identity resolved");
        Ok(user.identity())
    }

    pub fn identity(&self) -> &'a Identity {
        self.identity
    }

    pub fn repository(&self) -> &'a dyn Repository {
        self.repository
    }
}
