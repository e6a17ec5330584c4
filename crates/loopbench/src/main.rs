//! loopbench - benchmark harness for loop-sampling instrumentation targets.

use anyhow::{Context, Result};
use clap::Parser;
use loopbench::cli::Cli;
use loopbench::config::ExperimentConfig;
use loopbench::experiment::Experiment;
use loopbench::results::{SummaryPrinter, compute_stats, export_json};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick a default from the
    // verbose flag. Log output goes to stderr so tables and summaries
    // on stdout stay clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let json_output = cli.json.clone();

    let config = cli
        .into_config()
        .context("Failed to build experiment configuration")?;

    print_banner(&config);

    let experiment = Experiment::new(config.clone())
        .context("Failed to resolve experiment configuration")?;
    let outcome = experiment.run().context("Experiment failed")?;

    let printer = SummaryPrinter::new(config.color);
    println!();
    for (input_size, observations) in &outcome.batches {
        printer.print_batch(*input_size, &compute_stats(observations));
    }
    println!();
    printer.print_table_location("runtime", &outcome.runtime_table);
    if let Some(ref metric_table) = outcome.metric_table {
        printer.print_table_location("metric", metric_table);
        tracing::info!("{} metric row(s) merged", outcome.metric_rows);
    }

    if let Some(path) = json_output {
        export_json(&outcome.batches, &config, &path).context("Failed to export JSON report")?;
        println!("Report exported to: {}", path.display());
    }

    Ok(())
}

/// Print a compact one-line banner with the configuration summary.
fn print_banner(config: &ExperimentConfig) {
    use owo_colors::OwoColorize;

    let summary = format!(
        "{} / O{}{} - {} mode",
        config.variant,
        config.opt_level,
        if config.else_if { " / bElseIf" } else { "" },
        config.mode
    );

    println!();
    if config.color {
        println!("{}: {summary}", "loopbench".cyan().bold());
    } else {
        println!("loopbench: {summary}");
    }
    println!();
}
