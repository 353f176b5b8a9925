use std::process::ExitCode;

use anyhow::Context as _;
use parley::CompletionItem;
use tracing_subscriber::EnvFilter;

mod commands;

/// When set, print completion candidates for its value instead of running
const COMPLETE_VAR: &str = "_TEXTKIT_COMPLETE";

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let textkit = commands::textkit().context("invalid textkit declaration")?;

    if let Ok(incomplete) = std::env::var(COMPLETE_VAR) {
        let candidates = textkit
            .invocation()
            .auto_envvar_prefix("TEXTKIT")
            .complete(&incomplete);

        candidates.iter().for_each(print_candidate);
        return Ok(ExitCode::SUCCESS);
    }

    Ok(textkit
        .invocation()
        .auto_envvar_prefix("TEXTKIT")
        .obj(String::new())
        .main())
}

fn print_candidate(item: &CompletionItem) {
    match &item.help {
        Some(help) => println!("{}\t{help}", item.value),
        None => println!("{}", item.value),
    }
}
