use anyhow::Result;
use contentops_core::{load_inline, ContentId, StripLinks, StripMode};

use crate::session::Session;

pub fn handle_strip_links(
    session: &Session,
    content_ids: &str,
    field: Option<&str>,
    mode: Option<StripMode>,
    dry_run: bool,
) -> Result<()> {
    let ids: Vec<ContentId> = load_inline(content_ids)?;
    let defaults = &session.config.defaults;

    let operation = StripLinks::new(field.unwrap_or(&defaults.link_field))
        .mode(mode.unwrap_or(defaults.strip_mode))
        .dry_run(dry_run)
        .use_color(session.use_color);

    session.execute(&ids, &operation)?;
    Ok(())
}
