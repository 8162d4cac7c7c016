use super::MutationOperation;
use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::RepositoryError;
use crate::executor::Detail;
use crate::input::MoveRow;

/// Move a location and everything below it under a new parent.
///
/// Both ends are loaded per row so each move sees the effect of the rows
/// before it.
pub struct RelocateSubtree;

impl MutationOperation for RelocateSubtree {
    type Record = MoveRow;

    fn name(&self) -> &'static str {
        "move"
    }

    fn apply(&self, row: &MoveRow, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let locations = ctx.repository().locations();
        let location = locations.load_location(row.location_id)?;
        let new_parent = locations.load_location(row.new_parent_location_id)?;
        locations.move_subtree(ctx.identity(), &location, &new_parent)?;
        Ok(Detail::changed(format!(
            "moved {} to {}",
            location.path_string, new_parent.path_string
        )))
    }

    fn summary(&self, records: &[MoveRow]) -> Summary {
        Summary::count("Subtrees to move", records.len())
    }
}
