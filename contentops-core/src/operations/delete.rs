use super::MutationOperation;
use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::RepositoryError;
use crate::executor::Detail;
use crate::model::ContentId;

/// Delete content objects together with every location and subtree below them.
pub struct DeleteContent;

impl MutationOperation for DeleteContent {
    type Record = ContentId;

    fn name(&self) -> &'static str {
        "delete"
    }

    fn apply(&self, id: &ContentId, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let content = ctx.repository().content();
        let info = content.load_content_info(*id)?;
        content.delete_content(ctx.identity(), &info)?;
        Ok(Detail::changed(format!("deleted '{}'", info.name)))
    }

    fn summary(&self, records: &[ContentId]) -> Summary {
        Summary::count("Content objects to delete, including all locations and subtrees", records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::executor::run;
    use crate::model::{Identity, UserId};
    use crate::report::NullReporter;
    use crate::repository::{InMemoryRepository, SnapshotBuilder};

    #[test]
    fn test_second_delete_is_not_found_and_other_records_proceed() {
        let repo = InMemoryRepository::new(
            SnapshotBuilder::new()
                .with_admin(14)
                .folder(1, 1, None)
                .folder(10, 10, Some(1))
                .folder(20, 20, Some(1))
                .build(),
        );
        let identity = Identity {
            user_id: UserId(14),
            login: "admin".to_string(),
        };
        let ctx = ExecutionContext::new(&identity, &repo);

        let first = run(&[ContentId(10)], &DeleteContent, &ctx, &mut NullReporter);
        assert!(first.all_succeeded());

        let second = run(&[ContentId(10), ContentId(20)], &DeleteContent, &ctx, &mut NullReporter);
        assert_eq!(second.outcomes[0].outcome.failure_kind(), Some(FailureKind::NotFound));
        assert!(second.outcomes[1].outcome.is_success());
    }
}
