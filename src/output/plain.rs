//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::detection::ServiceStore;
use crate::report::TargetReport;
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Print each report block, framed by a header naming the scan file.
pub fn print_plain(
    source: &str,
    reports: &[&TargetReport],
    services: Option<&ServiceStore>,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, source, reports, services)
}

pub(crate) fn write_plain<W: Write>(
    out: &mut W,
    source: &str,
    reports: &[&TargetReport],
    services: Option<&ServiceStore>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "  {} {}",
        style("Scan Report:").cyan().bold(),
        style(source).white().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    if reports.is_empty() {
        writeln!(out, "  {}", style("No open ports in any target range.").dim())?;
        writeln!(out)?;
        return Ok(());
    }

    for report in reports {
        writeln!(out, "{}", report.render(services))?;
    }

    Ok(())
}

/// Print the list of loaded target ranges.
pub fn print_targets<'a, I>(targets: I)
where
    I: IntoIterator<Item = &'a crate::types::TargetRange>,
{
    println!("{}", style("Target networks:").bold());
    for target in targets {
        println!("  {}", target);
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
