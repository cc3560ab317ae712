//! The `adaptest report` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::report::SessionReport;
use adaptest_report::html::generate_html;

use crate::display::render_results;

pub fn execute(input: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = SessionReport::load_json(&input)?;

    let rendered = match format.as_str() {
        "markdown" | "md" => report.to_markdown(),
        "html" => generate_html(&report),
        "text" => format!(
            "Source: {} ({})\n{}",
            report.source,
            report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            render_results(&report.results, report.bank_size)
        ),
        other => anyhow::bail!("unknown format '{other}' (expected text, markdown, html)"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
