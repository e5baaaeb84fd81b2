use console::style;
use prose_presentation::{PanelItem, PanelView};
use prose_protocol::{categorize, Finding, Severity};
use serde::Serialize;
use std::fmt::Write;

/// Human-readable report, grouped the way the findings panel groups
pub fn render_text(source: &str, findings: &[Finding], suggestion_cap: usize) -> String {
    let view = PanelView::build_with_cap(findings, None, suggestion_cap);
    let mut out = String::new();
    if view.is_empty() {
        let _ = writeln!(out, "{}: no issues found", style(source).bold());
        return out;
    }
    let _ = writeln!(
        out,
        "{}: {} issue(s) ({} correctness, {} clarity)",
        style(source).bold(),
        view.len(),
        view.correctness.len(),
        view.clarity.len()
    );
    render_section(&mut out, "Correctness", &view.correctness);
    render_section(&mut out, "Clarity", &view.clarity);
    out
}

fn render_section(out: &mut String, title: &str, items: &[PanelItem]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style(title).bold().underlined());
    for item in items {
        let marker = match item.severity {
            Severity::Error => style("x").red(),
            Severity::Warning => style("!").yellow(),
            Severity::Info => style("i").cyan(),
        };
        let _ = writeln!(
            out,
            "  {marker} {} [{}]",
            style(&item.text).bold(),
            item.rule_id
        );
        let _ = writeln!(out, "      {}", item.message);
        if !item.suggestions.is_empty() {
            let _ = writeln!(
                out,
                "      {} {}",
                style("suggest:").dim(),
                item.suggestions.join(", ")
            );
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: &'a str,
    total: usize,
    correctness: usize,
    clarity: usize,
    findings: &'a [Finding],
}

/// Machine-readable report for `--json`
pub fn render_json(source: &str, findings: &[Finding]) -> anyhow::Result<String> {
    let categorized = categorize(findings);
    let report = JsonReport {
        file: source,
        total: findings.len(),
        correctness: categorized.correctness.len(),
        clarity: categorized.clarity.len(),
        findings,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
