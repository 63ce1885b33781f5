use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = homekeep::cli::Cli::parse();
    homekeep::logging::init_tracing(cli.log_filter.as_deref())?;

    let config = homekeep::config::from_cli(&cli)?;
    let mut state = homekeep::AppState::open(&config)?;
    state.authenticate(&homekeep::config::auth_from_cli(&cli))?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    homekeep::commands::execute(&mut state, cli.command, &mut handle)?;
    Ok(())
}
