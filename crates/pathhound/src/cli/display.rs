//! Console output for the end of a run.

use colored::Colorize;
use pathhound::BatchOutcome;
use pathhound_tasklist::Warning;

/// Print skipped task-list lines.
pub fn print_task_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!(
        "{}: skipped {} task line(s)",
        "warning".yellow().bold(),
        warnings.len()
    );
    for warning in warnings {
        eprintln!("    {} {warning}", "•".dimmed());
    }
}

/// Print "N of M jobs completed" and one line per failed job.
pub fn print_summary(outcome: &BatchOutcome) {
    let delivered = outcome.delivered();
    let attempted = outcome.attempted();
    let counts = format!("{delivered} of {attempted} jobs completed");

    println!();
    if delivered == attempted {
        println!("{}", counts.green().bold());
    } else if delivered == 0 {
        println!("{}", counts.red().bold());
    } else {
        println!("{}", counts.yellow().bold());
    }

    for failure in outcome.failures() {
        println!("    {} {failure}", "•".dimmed());
    }
}
