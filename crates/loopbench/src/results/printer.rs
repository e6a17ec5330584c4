//! Compact terminal summary for finished batches.

use owo_colors::OwoColorize;

use crate::results::stats::BatchStats;
use crate::results::table::TIME_PRECISION;

/// Formats and prints per-batch summaries.
pub struct SummaryPrinter {
    color: bool,
}

impl SummaryPrinter {
    /// Printer with or without color.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Print the summary for one input size's batch:
    ///
    /// ```text
    /// input 1000
    ///   Time (mean ± σ):   0.10312 s ± 0.00255 s
    ///   Range (min … max): 0.09987 s … 0.10881 s    10 runs
    /// ```
    pub fn print_batch(&self, input_size: u64, stats: &BatchStats) {
        let mean = format_seconds(stats.mean_seconds);
        let std_dev = format_seconds(stats.std_dev_seconds);
        let min = format_seconds(stats.min_seconds);
        let max = format_seconds(stats.max_seconds);

        if self.color {
            println!("{} {}", "input".bold(), input_size.bold());
            println!(
                "  {} ({} ± {}):   {} ± {}",
                "Time".bold(),
                "mean".cyan(),
                "σ".cyan(),
                mean.cyan(),
                std_dev.cyan().dimmed()
            );
            println!(
                "  {} ({} … {}): {} … {}    {} runs",
                "Range".bold(),
                "min".green(),
                "max".yellow(),
                min.green(),
                max.yellow(),
                stats.runs
            );
        } else {
            println!("input {input_size}");
            println!("  Time (mean ± σ):   {mean} ± {std_dev}");
            println!(
                "  Range (min … max): {min} … {max}    {} runs",
                stats.runs
            );
        }
    }

    /// Print the location of a persisted table.
    pub fn print_table_location(&self, what: &str, path: &std::path::Path) {
        if self.color {
            println!("{} table: {}", what.bold(), path.display().green());
        } else {
            println!("{what} table: {}", path.display());
        }
    }
}

fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.prec$} s", prec = TIME_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_formatting_uses_table_precision() {
        assert_eq!(format_seconds(0.123456789), "0.12346 s");
        assert_eq!(format_seconds(2.0), "2.00000 s");
    }
}
