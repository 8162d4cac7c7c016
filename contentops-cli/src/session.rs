use anyhow::{Context, Result};
use contentops_core::{
    run_confirmed, AutoApprove, BatchResult, Config, Confirm, ConsoleReporter, ExecutionContext,
    Identity, InMemoryRepository, MutationOperation, OutputFormat, RepositoryLock, TerminalPrompt,
    UserId,
};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use crate::cli::Cli;

/// Everything a command needs once the repository is open.
pub struct Session {
    pub config: Config,
    pub repository: InMemoryRepository,
    pub identity: Identity,
    pub output: OutputFormat,
    pub use_color: bool,
    yes: bool,
    // Declared last so it is released after the repository is dropped.
    _lock: Option<RepositoryLock>,
}

impl Session {
    /// Load config, take the lock when `mutating`, open the snapshot and
    /// resolve the acting user.
    pub fn open(cli: &Cli, mutating: bool) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };

        let snapshot: PathBuf = cli
            .repository
            .clone()
            .unwrap_or_else(|| config.defaults.repository.clone());

        anyhow::ensure!(
            snapshot.exists(),
            "Repository snapshot not found: {}",
            snapshot.display()
        );

        tracing::debug!(snapshot = %snapshot.display(), mutating, "opening session");

        let lock = if mutating {
            Some(RepositoryLock::acquire(&snapshot)?)
        } else {
            None
        };

        let repository = InMemoryRepository::open(&snapshot)
            .with_context(|| format!("Failed to open repository {}", snapshot.display()))?;

        let acting_user = UserId(cli.as_user.unwrap_or(config.defaults.acting_user_id));
        let identity = ExecutionContext::bootstrap(&repository, acting_user)?;

        let use_color = !cli.no_color
            && config
                .defaults
                .use_color
                .unwrap_or_else(|| io::stdout().is_terminal());

        Ok(Self {
            config,
            repository,
            identity,
            output: cli.output.into(),
            use_color,
            yes: cli.yes,
            _lock: lock,
        })
    }

    pub fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.identity, &self.repository)
    }

    /// Prompts go to stderr in JSON mode so stdout stays one object per line.
    fn prompt_writer(&self) -> Box<dyn Write> {
        match self.output {
            OutputFormat::Json => Box::new(io::stderr()),
            OutputFormat::Summary => Box::new(io::stdout()),
        }
    }

    pub fn gate(&self) -> Box<dyn Confirm> {
        if self.yes {
            Box::new(AutoApprove::new(self.prompt_writer()))
        } else {
            Box::new(TerminalPrompt::new(io::stdin().lock(), self.prompt_writer()))
        }
    }

    pub fn reporter(&self) -> ConsoleReporter<io::Stdout> {
        ConsoleReporter::new(io::stdout(), self.output, self.use_color)
    }

    /// Confirm and run one batch with this session's gate and reporter.
    pub fn execute<O>(&self, records: &[O::Record], operation: &O) -> Result<BatchResult>
    where
        O: MutationOperation,
    {
        let ctx = self.context();
        let mut gate = self.gate();
        let mut reporter = self.reporter();
        let result = run_confirmed(records, operation, &ctx, gate.as_mut(), &mut reporter)?;
        Ok(result)
    }
}
