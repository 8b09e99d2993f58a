mod cli;
mod render;
mod replay;

use almanac_core::datetime::parse_day_expr;
use almanac_core::{Calendar, CalendarConfig};
use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use crate::cli::{Args, init_tracing};
use crate::render::Renderer;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet)?;

    let config = CalendarConfig::load(args.config.as_deref()).context("failed to load config")?;
    let today = config.today();
    let month = match args.month.as_deref() {
        Some(expr) => parse_day_expr(expr, today)
            .with_context(|| format!("invalid --month value: {expr}"))?,
        None => today,
    };

    let scripts = replay::load_scripts(&args.scripts)?;
    if scripts.is_empty() {
        bail!("no scripts to replay");
    }

    let renderer = Renderer::new(!args.no_color);
    for script in &scripts {
        let mut calendar = Calendar::with_month(config.clone(), month);
        let reports = replay::replay(&mut calendar, script)?;
        let rejected = reports.iter().filter(|r| r.is_rejected()).count();
        info!(script = %script.name, steps = reports.len(), rejected, "script replayed");

        if args.json {
            renderer.print_json(&calendar)?;
        } else {
            renderer.print_script(&script.name, &reports, &calendar)?;
        }
    }

    Ok(())
}
