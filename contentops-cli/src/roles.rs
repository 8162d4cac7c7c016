use anyhow::{Context, Result};
use contentops_core::confirm::{self, Summary};
use contentops_core::operations::roles::{resolve_role, resolve_target_user};
use contentops_core::{
    list_assignments, load_inline, AssignRole, AssignmentId, LegacyRoleGateway, LocationId,
    OutputFormat, OutputFormatter, RemoveAssignment, UserId,
};
use std::str::FromStr;

use crate::session::Session;

fn collect_ids<T>(lists: &[String]) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let mut ids = Vec::new();
    for list in lists {
        ids.extend(load_inline::<T>(list)?);
    }
    Ok(ids)
}

pub fn handle_list(session: &Session, user_id: u64) -> Result<()> {
    let user = resolve_target_user(&session.repository, UserId(user_id))?;

    let mut gate = session.gate();
    confirm::require(gate.as_mut(), &Summary::identity(&user))?;
    drop(gate);

    let mut gateway = LegacyRoleGateway::new(&session.repository);
    let listing = list_assignments(&mut gateway, session.identity.user_id, user.id)
        .context("Failed to read role assignments")?;
    tracing::debug!(user_id = %user.id, rows = listing.rows.len(), "role assignments listed");

    match session.output {
        OutputFormat::Json => println!("{}", listing.format_json()),
        OutputFormat::Summary if listing.rows.is_empty() => {
            println!("{}", listing.format_summary());
        },
        OutputFormat::Summary => println!("{}", listing.render_table(session.use_color)),
    }
    Ok(())
}

pub fn handle_roles(
    session: &Session,
    user_id: u64,
    add: &[String],
    remove: &[String],
) -> Result<()> {
    let locations: Vec<LocationId> = collect_ids(add)?;
    let assignments: Vec<AssignmentId> = collect_ids(remove)?;

    let user = resolve_target_user(&session.repository, UserId(user_id))?;

    // Resolve the role before asking anything so a bad identifier changes nobody.
    let role = if add.is_empty() {
        None
    } else {
        Some(resolve_role(
            &session.repository,
            &session.config.defaults.role_identifier,
        )?)
    };

    let mut gate = session.gate();
    confirm::require(gate.as_mut(), &Summary::identity(&user))?;
    drop(gate);

    if let Some(role) = role {
        session.execute(&locations, &AssignRole::new(role, user.clone()))?;
    }
    if !remove.is_empty() {
        session.execute(&assignments, &RemoveAssignment::new(user.id))?;
    }
    Ok(())
}
