use super::MutationOperation;
use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::RepositoryError;
use crate::executor::Detail;
use crate::model::ContentId;

/// Create a draft from the published version and publish it unchanged.
pub struct Republish;

impl MutationOperation for Republish {
    type Record = ContentId;

    fn name(&self) -> &'static str {
        "republish"
    }

    fn apply(&self, id: &ContentId, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let content = ctx.repository().content();
        let who = ctx.identity();

        let info = content.load_content_info(*id)?;
        let draft = content.create_content_draft(who, &info)?;
        let update = content.new_content_update();
        let draft = content.update_content(who, &draft, &update)?;
        let published = content.publish_version(who, &draft)?;

        Ok(Detail::changed(format!(
            "published version {}",
            published.current_version.unwrap_or(draft.number)
        )))
    }

    fn summary(&self, records: &[ContentId]) -> Summary {
        Summary::count("Content objects to republish", records.len())
    }
}
