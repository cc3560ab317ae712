//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use adaptest_core::engine::OutcomeRecord;
use adaptest_core::report::SessionReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML results page for a quiz session.
pub fn generate_html(report: &SessionReport) -> String {
    let r = &report.results;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>adaptest results: {}</title>\n",
        html_escape(&report.source)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Test Results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Source: <strong>{}</strong> | {} questions in bank | <time datetime=\"{}\">{}</time></p>\n",
        html_escape(&report.source),
        report.bank_size,
        report
            .created_at
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Overall metrics
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Overall Performance</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    for (label, value) in [
        ("Total Points", r.total_points.to_string()),
        ("Accuracy", format!("{:.1}%", r.accuracy)),
        (
            "Questions Answered",
            format!("{}/{}", r.questions_attempted, report.bank_size),
        ),
        ("Final Ability", format!("{:.2}", r.final_ability)),
    ] {
        html.push_str(&format!(
            "<div class=\"card\"><div class=\"label\">{label}</div><div class=\"value\">{value}</div></div>\n"
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<h2>Time Analysis</h2>\n");
    html.push_str("<table class=\"summary\">\n<tbody>\n");
    html.push_str(&format!(
        "<tr><th>Fastest response</th><td>{:.1}s</td></tr>\n",
        r.fastest_time
    ));
    html.push_str(&format!(
        "<tr><th>Slowest response</th><td>{:.1}s</td></tr>\n",
        r.slowest_time
    ));
    html.push_str(&format!(
        "<tr><th>Average difficulty</th><td>{:.2}</td></tr>\n",
        r.avg_difficulty
    ));
    html.push_str("</tbody></table>\n");

    html.push_str("<h2>Areas for Improvement</h2>\n");
    if r.incorrect_topics.is_empty() {
        html.push_str("<p class=\"success\">Great job! No specific areas need improvement.</p>\n");
    } else {
        html.push_str("<ul class=\"topics\">\n");
        for topic in &r.incorrect_topics {
            html.push_str(&format!("<li>{}</li>\n", html_escape(topic)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    // Progression chart
    if !r.question_history.is_empty() {
        html.push_str("<section class=\"chart\">\n");
        html.push_str("<h2>Difficulty Progression</h2>\n");
        html.push_str(&generate_line_chart(&r.question_history));
        html.push_str("</section>\n");
    }

    // Per-question history
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Question History</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"history\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Result</th><th onclick=\"sortTable(2)\">Difficulty</th><th onclick=\"sortTable(3)\">Multiplier</th><th onclick=\"sortTable(4)\">Points</th><th onclick=\"sortTable(5)\">Time</th><th onclick=\"sortTable(6)\">Ability</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for h in &r.question_history {
        let (class, text) = if h.is_correct {
            ("pass", "Correct")
        } else {
            ("fail", "Incorrect")
        };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{text}</td><td>{:.2}</td><td>{:.2}x</td><td>{}</td><td>{:.1}s</td><td>{:.2}</td></tr>\n",
            h.question_num, h.difficulty, h.multiplier, h.points_earned, h.time_taken, h.ability_after
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Line chart of question difficulty and ability after each answer, both on a 0-1 axis.
fn generate_line_chart(history: &[OutcomeRecord]) -> String {
    let width = 640.0;
    let height = 280.0;
    let padding = 40.0;
    let plot_w = width - 2.0 * padding;
    let plot_h = height - 2.0 * padding;

    let step = if history.len() > 1 {
        plot_w / (history.len() - 1) as f64
    } else {
        0.0
    };
    let x = |i: usize| padding + i as f64 * step;
    let y = |v: f64| padding + (1.0 - v.clamp(0.0, 1.0)) * plot_h;

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );

    // Gridlines and y labels
    for tick in [0.0, 0.25, 0.5, 0.75, 1.0] {
        svg.push_str(&format!(
            "  <line x1=\"{padding}\" y1=\"{y:.1}\" x2=\"{x2}\" y2=\"{y:.1}\" stroke=\"var(--border)\"/>\n",
            y = y(tick),
            x2 = padding + plot_w
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{tick:.2}</text>\n",
            padding - 6.0,
            y(tick)
        ));
    }

    // x labels
    for (i, h) in history.iter().enumerate() {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            x(i),
            height - padding + 16.0,
            h.question_num
        ));
    }

    let difficulty: Vec<f64> = history.iter().map(|h| h.difficulty).collect();
    let ability: Vec<f64> = history.iter().map(|h| h.ability_after).collect();
    for (class, color, values) in [
        ("difficulty", "#3b82f6", &difficulty),
        ("ability", "#22c55e", &ability),
    ] {
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", x(i), y(*v)))
            .collect();
        svg.push_str(&format!(
            "  <polyline class=\"{class}\" points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
            points.join(" ")
        ));
        for (i, v) in values.iter().enumerate() {
            svg.push_str(&format!(
                "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{color}\"/>\n",
                x(i),
                y(*v)
            ));
        }
    }

    // Legend
    svg.push_str(&format!(
        "  <text x=\"{padding}\" y=\"20\" font-size=\"12\" fill=\"#3b82f6\">● Question difficulty</text>\n"
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"20\" font-size=\"12\" fill=\"#22c55e\">● Your ability</text>\n",
        padding + 160.0
    ));

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.cards { display: flex; flex-wrap: wrap; gap: 1rem; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 10rem; }
.card .label { color: #6b7280; font-size: 0.85rem; }
.card .value { font-size: 1.6rem; font-weight: bold; }
.success { color: #16a34a; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.results-table th { cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; max-width: 100%; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('history');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    const cmp = isNaN(na) || isNaN(nb) ? va.localeCompare(vb) : na - nb;
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::engine::FinalResults;

    fn record(num: u32, is_correct: bool, difficulty: f64, ability_after: f64) -> OutcomeRecord {
        OutcomeRecord {
            question_num: num,
            is_correct,
            time_taken: 3.5,
            difficulty,
            points_earned: if is_correct { 10 } else { 0 },
            multiplier: 1.0 + (difficulty - 0.5),
            ability_after,
            question_index: Some(num as usize - 1),
        }
    }

    fn make_test_report(incorrect_topics: Vec<String>) -> SessionReport {
        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            source: "cells <intro>.txt".into(),
            bank_size: 20,
            results: FinalResults {
                total_points: 10,
                questions_attempted: 2,
                correct_answers: 1,
                accuracy: 50.0,
                avg_difficulty: 0.55,
                fastest_time: 3.5,
                slowest_time: 3.5,
                final_ability: 0.52,
                incorrect_topics,
                question_history: vec![record(1, true, 0.5, 0.6), record(2, false, 0.6, 0.52)],
            },
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report(vec!["Cell <membranes>".into()]);
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Areas for Improvement"));
        assert!(html.contains("<li>Cell &lt;membranes&gt;</li>"));
        assert!(html.contains("cells &lt;intro&gt;.txt"));
        assert!(!html.contains("<intro>"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("2/20"));
        assert!(html.contains("<polyline class=\"difficulty\""));
        assert!(html.contains("<polyline class=\"ability\""));
        assert!(html.contains("Incorrect"));
    }

    #[test]
    fn no_weak_topics_message() {
        let html = generate_html(&make_test_report(vec![]));
        assert!(html.contains("No specific areas need improvement."));
        assert!(!html.contains("<ul class=\"topics\">"));
    }

    #[test]
    fn chart_scales_points_into_plot() {
        let svg = generate_line_chart(&[record(1, true, 0.5, 0.6), record(2, true, 0.9, 0.7)]);
        // 640 wide with 40px padding: first point at x=40, last at x=600
        assert!(svg.contains("points=\"40.0,140.0 600.0,60.0\""));
    }

    #[test]
    fn single_answer_chart_has_one_point() {
        let svg = generate_line_chart(&[record(1, false, 0.5, 0.42)]);
        assert!(svg.contains("points=\"40.0,140.0\""));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
