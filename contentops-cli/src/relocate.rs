use anyhow::Result;
use contentops_core::{load_move_rows, RelocateSubtree};
use std::path::Path;

use crate::session::Session;

pub fn handle_move(session: &Session, input: &Path) -> Result<()> {
    let rows = load_move_rows(input)?;
    session.execute(&rows, &RelocateSubtree)?;
    Ok(())
}
