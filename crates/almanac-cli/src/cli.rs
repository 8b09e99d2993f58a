use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Replays recorded calendar gestures and prints the resulting month"
)]
pub struct Args {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Month shown when a script names none: today, +1w, -30d, 2024-06-01, ...
    #[arg(long = "month")]
    pub month: Option<String>,

    /// Print visible tasks as JSON instead of the month grid and table.
    #[arg(long = "json")]
    pub json: bool,

    #[arg(long = "no-color")]
    pub no_color: bool,

    #[arg(required = true)]
    pub scripts: Vec<PathBuf>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn parses_flags_and_scripts() {
        let args = Args::try_parse_from([
            "almanac", "-vv", "--month", "2024-06-01", "--json", "a.json", "b.json",
        ])
        .expect("parse args");
        assert_eq!(args.verbose, 2);
        assert_eq!(args.month.as_deref(), Some("2024-06-01"));
        assert!(args.json);
        assert_eq!(args.scripts.len(), 2);
    }

    #[test]
    fn requires_a_script() {
        assert!(Args::try_parse_from(["almanac"]).is_err());
    }
}
