use anyhow::Result;
use clap::Parser;
use contentops_core::{FatalError, OutputFormatter, VersionResult};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod delete;
mod relocate;
mod republish;
mod roles;
mod session;
mod strip_links;

use cli::{Cli, Commands, OutputFormat};
use session::Session;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Version => handle_version(cli.output),
        Commands::Roles {
            user_id,
            list: true,
            ..
        } => Session::open(&cli, false).and_then(|s| roles::handle_list(&s, *user_id)),
        command => Session::open(&cli, true).and_then(|s| dispatch(&s, command)),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            if e
                .downcast_ref::<FatalError>()
                .is_some_and(FatalError::is_aborted)
            {
                println!("{e}");
                process::exit(0);
            }
            eprintln!("Error: {e:#}");
            process::exit(1);
        },
    }
}

fn dispatch(session: &Session, command: &Commands) -> Result<()> {
    match command {
        Commands::Delete { content_ids } => delete::handle_delete(session, content_ids),
        Commands::Move { input } => relocate::handle_move(session, input),
        Commands::Republish { content_ids } => republish::handle_republish(session, content_ids),
        Commands::StripLinks {
            content_ids,
            field,
            mode,
            dry_run,
        } => strip_links::handle_strip_links(
            session,
            content_ids,
            field.as_deref(),
            mode.map(Into::into),
            *dry_run,
        ),
        Commands::Roles {
            user_id,
            add,
            remove,
            ..
        } => roles::handle_roles(session, *user_id, add, remove),
        Commands::Version => handle_version(OutputFormat::Summary),
    }
}

fn handle_version(output: OutputFormat) -> Result<()> {
    let version_result = VersionResult {
        name: "contentops".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("{}", version_result.format(output.into()));
    Ok(())
}
