//! Text rendering of cycle reports for the terminal.

use super::cycle::CycleReport;
use super::scanner::RiskyContract;

/// Risky contracts ordered for display: lowest leverage first, then by symbol.
pub fn sorted_by_leverage(risky: &[RiskyContract]) -> Vec<&RiskyContract> {
    let mut rows: Vec<&RiskyContract> = risky.iter().collect();
    rows.sort_by(|a, b| a.leverage.cmp(&b.leverage).then_with(|| a.symbol.cmp(&b.symbol)));
    rows
}

/// Ranked table of risky contracts, one row per line, numbered from 1.
pub fn render_table(risky: &[RiskyContract]) -> String {
    let mut out = format!(
        "{:>4}  {:<16} {:>12} {:>16}\n",
        "#", "Symbol", "Max Leverage", "Notional Cap"
    );
    for (i, contract) in sorted_by_leverage(risky).into_iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<16} {:>11}x {:>16}\n",
            i + 1,
            contract.symbol,
            contract.leverage,
            contract.notional_cap
        ));
    }
    out
}

/// Cycle report as pretty-printed JSON, the only thing `scan --json` writes
/// to stdout.
pub fn to_json(report: &CycleReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// One-line summary of a cycle.
pub fn summary_line(report: &CycleReport) -> String {
    let mut line = format!("{} high-risk contract(s)", report.risky.len());
    if !report.newly_risky.is_empty() {
        line.push_str(&format!(", new: {}", report.newly_risky.join(", ")));
    }
    if let Some(problem) = report.problem() {
        line.push_str(&format!(" [{}]", problem));
    }
    line
}
