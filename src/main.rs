use anyhow::{Context as _, Result};
use std::io::{self, Write};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use warppipe::{
    Pipeline, StageRegistry,
    cli::{self, CliError},
};

fn main() -> Result<()> {
    // logs go to stderr so they never mix with pipeline output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = StageRegistry::builtin();
    let invocation = match cli::parse(std::env::args_os(), &registry) {
        Ok(invocation) => invocation,
        Err(CliError::Clap(e)) => e.exit(),
        Err(CliError::Pipeline(e)) => return Err(e).context("invalid pipeline"),
    };

    if invocation.list_stages {
        let mut stdout = io::stdout().lock();
        stdout.write_all(cli::render_stage_list(&registry).as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    let pipeline = Pipeline::builder(&registry)
        .defaults(invocation.defaults)
        .add_stages(invocation.stages)
        .build()
        .context("invalid pipeline")?;

    let summary = pipeline
        .run(io::stdin().lock(), io::stdout().lock())
        .context("pipeline failed")?;
    tracing::debug!(?summary, "done");
    Ok(())
}
