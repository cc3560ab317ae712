//! Session report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::FinalResults;

/// A saved record of one completed quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Where the question bank came from (file name or document).
    pub source: String,
    /// Number of questions in the bank.
    pub bank_size: usize,
    /// Aggregated results.
    pub results: FinalResults,
}

impl SessionReport {
    pub fn new(source: impl Into<String>, bank_size: usize, results: FinalResults) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: source.into(),
            bank_size,
            results,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let r = &self.results;
        let mut md = String::new();

        md.push_str("## Test Results\n\n");
        md.push_str(&format!(
            "_Source: {} · {}_\n\n",
            self.source,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Total points | {} |\n", r.total_points));
        md.push_str(&format!("| Accuracy | {:.1}% |\n", r.accuracy));
        md.push_str(&format!(
            "| Questions answered | {}/{} |\n",
            r.questions_attempted, self.bank_size
        ));
        md.push_str(&format!("| Final ability | {:.2} |\n", r.final_ability));
        md.push_str(&format!("| Average difficulty | {:.2} |\n", r.avg_difficulty));
        md.push_str(&format!("| Fastest response | {:.1}s |\n", r.fastest_time));
        md.push_str(&format!("| Slowest response | {:.1}s |\n", r.slowest_time));
        md.push('\n');

        md.push_str("### Areas for Improvement\n\n");
        if r.incorrect_topics.is_empty() {
            md.push_str("No specific areas need improvement.\n");
        } else {
            for topic in &r.incorrect_topics {
                md.push_str(&format!("- {topic}\n"));
            }
        }
        md.push('\n');

        if !r.question_history.is_empty() {
            md.push_str("### Question History\n\n");
            md.push_str("| # | Result | Difficulty | Points | Time | Ability |\n");
            md.push_str("|---|--------|------------|--------|------|---------|\n");
            for h in &r.question_history {
                md.push_str(&format!(
                    "| {} | {} | {:.2} | {} | {:.1}s | {:.2} |\n",
                    h.question_num,
                    if h.is_correct { "correct" } else { "incorrect" },
                    h.difficulty,
                    h.points_earned,
                    h.time_taken,
                    h.ability_after
                ));
            }
        }

        md
    }
}
