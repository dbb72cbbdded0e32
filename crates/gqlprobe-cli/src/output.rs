//! Terminal rendering of crawl results.

use crossterm::style::{StyledContent, Stylize};

use gqlprobe_core::{CrawlReport, Operation, Outcome};

/// Colors an outcome label. Exposure is what the user is looking for, so
/// allowed is red and denied is green.
fn styled_label(outcome: Outcome) -> StyledContent<&'static str> {
    let label = outcome.label();
    match outcome {
        Outcome::Allowed => label.red().bold(),
        Outcome::Denied => label.green(),
        Outcome::Failed => label.yellow(),
        Outcome::Skipped => label.dark_grey(),
    }
}

/// Prints one result line, plus the response for allowed operations and the
/// error for failed or skipped ones.
pub fn print_operation(op: &Operation) {
    println!("\"{}\" ({}): {}", op.name, op.kind, styled_label(op.outcome));

    match op.outcome {
        Outcome::Allowed => {
            if let Some(response) = &op.response {
                let body = serde_json::to_string(response).unwrap_or_default();
                println!("\tResponse: {}", body);
            }
        }
        Outcome::Failed | Outcome::Skipped => {
            if let Some(reason) = op.failure_reason() {
                println!("\tError: {}", reason.dim());
            }
        }
        Outcome::Denied => {}
    }
}

/// Prints every operation followed by a summary.
pub fn print_report(report: &CrawlReport) {
    for op in &report.operations {
        print_operation(op);
    }

    println!();
    println!(
        "{} operations against {}: {} allowed, {} denied, {} failed, {} skipped",
        report.operations.len(),
        report.target.clone().bold(),
        report.count(Outcome::Allowed),
        report.count(Outcome::Denied),
        report.count(Outcome::Failed),
        report.count(Outcome::Skipped),
    );
}
