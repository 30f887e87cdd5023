//! Markdown and HTML report generation.
//!
//! Renders the summary counters and the three table views. Display-only
//! rules live here: member lists are shortened, missing ids get a
//! placeholder and every empty view gets its own message.

use crate::analysis::TierBreakdown;
use crate::graph::GraphScene;
use crate::models::{RiskTier, Summary};
use crate::report::tables::{AccountRow, RepeatOffenderRow, ReportTables, RingRow, TableView};
use chrono::{DateTime, Utc};

const NO_RINGS: &str = "No fraud rings detected";
const NO_ACCOUNTS: &str = "No suspicious accounts detected";
const NO_REPEAT_OFFENDERS: &str = "No repeat offenders detected";

/// Everything a rendered report shows.
pub struct ReportDocument<'a> {
    /// Where the payload came from (file path or service URL).
    pub source: &'a str,
    pub generated_at: DateTime<Utc>,
    pub summary: &'a Summary,
    pub tables: &'a ReportTables,
    pub scene: &'a GraphScene,
    pub ring_tiers: TierBreakdown,
    pub account_tiers: TierBreakdown,
    /// Seconds the analysis took, as measured by the client or reported by the service.
    pub processing_time: Option<f64>,
}

/// Display settings.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Members shown per ring row; 0 shows all.
    pub member_preview: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { member_preview: 3 }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(doc: &ReportDocument<'_>, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Fraud Ring Analysis Report\n\n");
    output.push_str(&markdown_metadata(doc));
    output.push_str(&markdown_summary(doc));
    output.push_str(&markdown_rings(&doc.tables.rings, options));
    output.push_str(&markdown_accounts(&doc.tables.accounts));
    output.push_str(&markdown_repeat_offenders(&doc.tables.repeat_offenders));
    output.push_str(&markdown_graph(doc.scene));
    output.push_str("---\n\n*Report generated by RingLens*\n");

    output
}

fn markdown_metadata(doc: &ReportDocument<'_>) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", doc.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(seconds) = doc.processing_time {
        section.push_str(&format!("- **Processing Time:** {:.1}s\n", seconds));
    }
    section.push('\n');

    section
}

fn markdown_summary(doc: &ReportDocument<'_>) -> String {
    let summary = doc.summary;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Accounts Analyzed | Suspicious Accounts | Fraud Rings |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.total_accounts_analyzed,
        summary.suspicious_accounts_flagged,
        summary.fraud_rings_detected
    ));

    let extras = summary_extras(summary);
    if !extras.is_empty() {
        for (label, value) in extras {
            section.push_str(&format!("- **{}:** {}\n", label, value));
        }
        section.push('\n');
    }

    if doc.ring_tiers.total() + doc.account_tiers.total() > 0 {
        section.push_str("### Risk Tiers\n\n");
        section.push_str(&format!(
            "| | {} High | {} Medium | {} Low |\n",
            RiskTier::High.emoji(),
            RiskTier::Medium.emoji(),
            RiskTier::Low.emoji()
        ));
        section.push_str("|:---|:---:|:---:|:---:|\n");
        for (label, tiers) in [("Rings", doc.ring_tiers), ("Accounts", doc.account_tiers)] {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                label, tiers.high, tiers.medium, tiers.low
            ));
        }
        section.push('\n');
    }

    section
}

fn markdown_rings(view: &TableView<RingRow>, options: &RenderOptions) -> String {
    let mut section = String::from("## Fraud Rings\n\n");

    if view.is_empty() {
        section.push_str(&format!("*{}*\n\n", NO_RINGS));
        return section;
    }

    section.push_str("| Ring ID | Pattern | Members | Risk | Accounts |\n");
    section.push_str("|:---|:---|:---:|:---:|:---|\n");
    for row in view.rows() {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} {:.1} | {} |\n",
            md_cell(ring_label(&row.ring_id)),
            md_cell(pattern_label(&row.pattern_type)),
            row.member_count,
            row.tier.emoji(),
            row.risk_score,
            md_cell(&preview_members(&row.members, options.member_preview))
        ));
    }
    section.push('\n');

    section
}

fn markdown_accounts(view: &TableView<AccountRow>) -> String {
    let mut section = String::from("## Suspicious Accounts\n\n");

    if view.is_empty() {
        section.push_str(&format!("*{}*\n\n", NO_ACCOUNTS));
        return section;
    }

    section.push_str("| Account | Score | Patterns | Ring |\n");
    section.push_str("|:---|:---:|:---|:---|\n");
    for row in view.rows() {
        section.push_str(&format!(
            "| **{}** | {} {:.1} | {} | {} |\n",
            md_cell(&row.account_id),
            row.tier.emoji(),
            row.suspicion_score,
            md_cell(&row.detected_patterns.join(", ")),
            md_cell(row.ring_id.as_deref().unwrap_or("None"))
        ));
    }
    section.push('\n');

    section
}

fn markdown_repeat_offenders(view: &TableView<RepeatOffenderRow>) -> String {
    let mut section = String::from("## Repeat Offenders\n\n");

    if view.is_empty() {
        section.push_str(&format!("*{}*\n\n", NO_REPEAT_OFFENDERS));
        return section;
    }

    section.push_str("| Account | Rings | Ring IDs | Patterns | Avg Risk |\n");
    section.push_str("|:---|:---:|:---|:---|:---:|\n");
    for row in view.rows() {
        section.push_str(&format!(
            "| **{}** | {} | {} | {} | {} {:.1} |\n",
            md_cell(&row.account_id),
            row.ring_count,
            md_cell(&row.ring_ids.join(", ")),
            md_cell(&row.pattern_types.join(", ")),
            row.tier.emoji(),
            row.avg_risk_score
        ));
    }
    section.push('\n');

    section
}

fn markdown_graph(scene: &GraphScene) -> String {
    let mut section = String::from("## Account Graph\n\n");

    if scene.is_empty() {
        section.push_str("*No graph data available.*\n\n");
        return section;
    }

    section.push_str(&format!(
        "- **Nodes:** {}\n- **Edges:** {}\n- **Radius:** {:.1}\n",
        scene.nodes.len(),
        scene.edges.len(),
        scene.radius
    ));
    if scene.synthetic {
        section.push_str("- *Placeholder nodes: the report lists no accounts.*\n");
    }
    section.push('\n');

    section
}

/// Generate a standalone HTML report.
pub fn generate_html_report(doc: &ReportDocument<'_>, options: &RenderOptions) -> String {
    let summary = doc.summary;
    let processing = doc
        .processing_time
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "-".to_string());

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Fraud Ring Analysis Report</title>\n");
    html.push_str(HTML_STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str("<h1>Fraud Ring Analysis Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} &middot; {}</p>\n",
        html_escape(doc.source),
        doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    html.push_str("<section class=\"stats\">\n");
    for (label, value) in [
        ("Accounts Analyzed", summary.total_accounts_analyzed.to_string()),
        ("Suspicious Accounts", summary.suspicious_accounts_flagged.to_string()),
        ("Fraud Rings", summary.fraud_rings_detected.to_string()),
        ("Processing Time (s)", processing),
    ] {
        html.push_str(&format!(
            "  <div class=\"stat-card\"><span class=\"value\">{}</span><span class=\"label\">{}</span></div>\n",
            html_escape(&value),
            label
        ));
    }
    html.push_str("</section>\n");

    html.push_str(&html_table(
        "Fraud Rings",
        &["Ring ID", "Pattern", "Members", "Risk", "Accounts"],
        NO_RINGS,
        doc.tables
            .rings
            .rows()
            .iter()
            .map(|row| {
                vec![
                    cell(&format!(
                        "<span class=\"ring-badge\">{}</span>",
                        html_escape(ring_label(&row.ring_id))
                    )),
                    cell(&html_escape(pattern_label(&row.pattern_type))),
                    cell(&row.member_count.to_string()),
                    score_cell(row.risk_score, row.tier),
                    cell(&html_escape(&preview_members(
                        &row.members,
                        options.member_preview,
                    ))),
                ]
            })
            .collect(),
    ));

    html.push_str(&html_table(
        "Suspicious Accounts",
        &["Account", "Score", "Patterns", "Ring"],
        NO_ACCOUNTS,
        doc.tables
            .accounts
            .rows()
            .iter()
            .map(|row| {
                vec![
                    cell(&format!("<strong>{}</strong>", html_escape(&row.account_id))),
                    score_cell(row.suspicion_score, row.tier),
                    cell(&html_escape(&row.detected_patterns.join(", "))),
                    cell(&html_escape(row.ring_id.as_deref().unwrap_or("None"))),
                ]
            })
            .collect(),
    ));

    html.push_str(&html_table(
        "Repeat Offenders",
        &["Account", "Rings", "Ring IDs", "Patterns", "Avg Risk"],
        NO_REPEAT_OFFENDERS,
        doc.tables
            .repeat_offenders
            .rows()
            .iter()
            .map(|row| {
                vec![
                    cell(&format!("<strong>{}</strong>", html_escape(&row.account_id))),
                    cell(&format!("<span class=\"ring-badge\">{}</span>", row.ring_count)),
                    cell(&html_escape(&row.ring_ids.join(", "))),
                    cell(&html_escape(&row.pattern_types.join(", "))),
                    score_cell(row.avg_risk_score, row.tier),
                ]
            })
            .collect(),
    ));

    html.push_str("<footer><p>Generated by RingLens</p></footer>\n</body>\n</html>\n");
    html
}

fn html_table(title: &str, headers: &[&str], empty_message: &str, rows: Vec<Vec<String>>) -> String {
    let mut table = format!("<section>\n<h2>{}</h2>\n<table>\n<thead><tr>", title);
    for header in headers {
        table.push_str(&format!("<th>{}</th>", header));
    }
    table.push_str("</tr></thead>\n<tbody>\n");

    if rows.is_empty() {
        table.push_str(&format!(
            "<tr><td colspan=\"{}\" class=\"no-data\">{}</td></tr>\n",
            headers.len(),
            empty_message
        ));
    }
    for row in rows {
        table.push_str("<tr>");
        for value in row {
            table.push_str(&value);
        }
        table.push_str("</tr>\n");
    }

    table.push_str("</tbody>\n</table>\n</section>\n");
    table
}

fn cell(inner: &str) -> String {
    format!("<td>{}</td>", inner)
}

fn score_cell(score: f64, tier: RiskTier) -> String {
    format!("<td class=\"{}\">{:.1}</td>", tier.css_class(), score)
}

/// First `limit` members joined, with `...` when some were cut. 0 shows all.
pub fn preview_members(members: &[String], limit: usize) -> String {
    if limit == 0 || members.len() <= limit {
        return members.join(", ");
    }
    format!("{}...", members[..limit].join(", "))
}

fn ring_label(ring_id: &str) -> &str {
    if ring_id.is_empty() {
        "Unknown"
    } else {
        ring_id
    }
}

fn pattern_label(pattern: &str) -> &str {
    if pattern.is_empty() {
        "unknown"
    } else {
        pattern
    }
}

/// Optional service counters that were present in the payload.
fn summary_extras(summary: &Summary) -> Vec<(&'static str, String)> {
    let mut extras = Vec::new();
    let counters = [
        ("Transactions", summary.total_transactions),
        ("Merchant Accounts", summary.merchant_accounts_detected),
        ("Normal Accounts", summary.normal_accounts),
        ("Repeat Offenders (service)", summary.repeat_offenders),
        ("Single-Ring Members", summary.single_ring_members),
    ];
    for (label, value) in counters {
        if let Some(value) = value {
            extras.push((label, value.to_string()));
        }
    }
    if let Some(seconds) = summary.processing_time_seconds {
        extras.push(("Service Processing Time", format!("{:.2}s", seconds)));
    }
    extras
}

/// Escape the column separator inside a Markdown table cell.
fn md_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const HTML_STYLE: &str = r#"<style>
body { background: #0a0a0a; color: #e0e0e0; font-family: Inter, Arial, sans-serif; margin: 2rem; }
h1, h2 { color: #ffffff; }
.meta { color: #888888; }
.stats { display: flex; gap: 1rem; margin: 1.5rem 0; }
.stat-card { background: #151515; border: 1px solid #333333; border-radius: 8px; padding: 1rem 1.5rem; display: flex; flex-direction: column; }
.stat-card .value { font-size: 1.8rem; font-weight: bold; }
.stat-card .label { color: #888888; font-size: 0.85rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border-bottom: 1px solid #333333; padding: 0.5rem 0.75rem; text-align: left; }
.ring-badge { background: #ff3b3b22; color: #ff6b6b; border-radius: 4px; padding: 0.1rem 0.4rem; }
.score-high { color: #ff3b3b; font-weight: bold; }
.score-medium { color: #ffaa00; }
.score-low { color: #00ff88; }
.no-data { color: #888888; text-align: center; font-style: italic; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{account_tiers, compute_repeat_offenders, ring_tiers};
    use crate::graph::{build_scene, LayoutParams};
    use crate::models::NormalizedReport;
    use serde_json::json;

    fn sample_report() -> NormalizedReport {
        crate::ingest::normalize(&json!({
            "suspicious_accounts": [
                {"account_id": "ACC_<1>", "suspicion_score": 95, "detected_patterns": ["cycle"], "ring_id": "R1"}
            ],
            "fraud_rings": [
                {"ring_id": "R1", "pattern_type": "cycle", "member_accounts": ["A", "B", "C", "D"], "risk_score": 85},
                {"ring_id": "", "member_accounts": ["A"], "risk_score": 40}
            ],
            "summary": {"total_accounts_analyzed": 10, "suspicious_accounts_flagged": 1, "fraud_rings_detected": 2, "total_transactions": 77}
        }))
        .unwrap()
    }

    fn render<T>(report: &NormalizedReport, f: impl Fn(&ReportDocument<'_>) -> T) -> T {
        let offenders = compute_repeat_offenders(&report.fraud_rings);
        let tables = ReportTables::project(report, &offenders);
        let (scene, _) = build_scene(report, &LayoutParams::default());
        let doc = ReportDocument {
            source: "payload.json",
            generated_at: Utc::now(),
            summary: &report.summary,
            tables: &tables,
            scene: &scene,
            ring_tiers: ring_tiers(&report.fraud_rings),
            account_tiers: account_tiers(&report.suspicious_accounts),
            processing_time: Some(1.234),
        };
        f(&doc)
    }

    #[test]
    fn test_preview_members() {
        let members: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(preview_members(&members, 3), "A, B, C...");
        assert_eq!(preview_members(&members[..3], 3), "A, B, C");
        assert_eq!(preview_members(&members, 0), "A, B, C, D");
        assert_eq!(preview_members(&[], 3), "");
    }

    #[test]
    fn test_markdown_report_sections() {
        let markdown = render(&sample_report(), |doc| {
            generate_markdown_report(doc, &RenderOptions::default())
        });

        assert!(markdown.contains("# Fraud Ring Analysis Report"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("| 10 | 1 | 2 |"));
        assert!(markdown.contains("- **Transactions:** 77"));
        assert!(markdown.contains("A, B, C..."));
        assert!(markdown.contains("`Unknown` | unknown"));
        assert!(markdown.contains("- **Processing Time:** 1.2s"));
        assert!(!markdown.contains(NO_REPEAT_OFFENDERS));
    }

    #[test]
    fn test_markdown_empty_states() {
        let report = NormalizedReport::default();
        let markdown = render(&report, |doc| {
            generate_markdown_report(doc, &RenderOptions::default())
        });

        assert!(markdown.contains(NO_RINGS));
        assert!(markdown.contains(NO_ACCOUNTS));
        assert!(markdown.contains(NO_REPEAT_OFFENDERS));
        assert!(markdown.contains("No graph data available"));
        assert!(!markdown.contains("### Risk Tiers"));
    }

    #[test]
    fn test_html_report_escapes_and_classes() {
        let html = render(&sample_report(), |doc| {
            generate_html_report(doc, &RenderOptions::default())
        });

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("ACC_&lt;1&gt;"));
        assert!(!html.contains("ACC_<1>"));
        assert!(html.contains("<td class=\"score-high\">95.0</td>"));
        assert!(html.contains("<td class=\"score-low\">40.0</td>"));
        assert!(html.contains("<span class=\"value\">1.2</span>"));
    }

    #[test]
    fn test_html_empty_states() {
        let html = render(&NormalizedReport::default(), |doc| {
            generate_html_report(doc, &RenderOptions::default())
        });

        assert!(html.contains(&format!("class=\"no-data\">{}</td>", NO_RINGS)));
        assert!(html.contains(&format!("class=\"no-data\">{}</td>", NO_ACCOUNTS)));
        assert!(html.contains(&format!(
            "class=\"no-data\">{}</td>",
            NO_REPEAT_OFFENDERS
        )));
    }

    #[test]
    fn test_markdown_cells_escape_pipes() {
        let report = crate::ingest::normalize(&json!({
            "suspicious_accounts": [
                {"account_id": "A|1", "suspicion_score": 60, "detected_patterns": ["fan|in"], "ring_id": "R|1"}
            ],
            "fraud_rings": [
                {"ring_id": "R|1", "pattern_type": "cy|cle", "member_accounts": ["A|1", "B"], "risk_score": 70},
                {"ring_id": "R2", "pattern_type": "cycle", "member_accounts": ["A|1"], "risk_score": 50}
            ]
        }))
        .unwrap();
        let markdown = render(&report, |doc| {
            generate_markdown_report(doc, &RenderOptions::default())
        });

        assert!(markdown.contains("| `R\\|1` | cy\\|cle | 2 |"));
        assert!(markdown.contains("| **A\\|1** |"));
        assert!(markdown.contains("| fan\\|in | R\\|1 |"));
        assert!(markdown.contains("| R\\|1, R2 |"));

        // Every table row keeps its column count.
        for line in markdown.lines().filter(|l| l.starts_with("| **A")) {
            let separators = line.replace("\\|", "").matches('|').count();
            assert!(separators == 5 || separators == 6, "{}", line);
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}
