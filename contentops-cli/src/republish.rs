use anyhow::Result;
use contentops_core::{load_inline, ContentId, Republish};

use crate::session::Session;

pub fn handle_republish(session: &Session, content_ids: &str) -> Result<()> {
    let ids: Vec<ContentId> = load_inline(content_ids)?;
    session.execute(&ids, &Republish)?;
    Ok(())
}
