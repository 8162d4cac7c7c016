use anyhow::Result;
use contentops_core::{load_inline, ContentId, DeleteContent};

use crate::session::Session;

pub fn handle_delete(session: &Session, content_ids: &str) -> Result<()> {
    let ids: Vec<ContentId> = load_inline(content_ids)?;
    session.execute(&ids, &DeleteContent)?;
    Ok(())
}
