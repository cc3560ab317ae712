//! Terminal rendering shared by `take` and `report`.

use comfy_table::{Cell, Table};

use adaptest_core::engine::FinalResults;

/// Summary metrics table for a finished session.
pub fn results_table(results: &FinalResults, bank_size: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Total points"),
        Cell::new(results.total_points),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{:.1}%", results.accuracy)),
    ]);
    table.add_row(vec![
        Cell::new("Questions answered"),
        Cell::new(format!("{}/{}", results.questions_attempted, bank_size)),
    ]);
    table.add_row(vec![
        Cell::new("Final ability"),
        Cell::new(format!("{:.2}", results.final_ability)),
    ]);
    table.add_row(vec![
        Cell::new("Average difficulty"),
        Cell::new(format!("{:.2}", results.avg_difficulty)),
    ]);
    table.add_row(vec![
        Cell::new("Fastest response"),
        Cell::new(format!("{:.1}s", results.fastest_time)),
    ]);
    table.add_row(vec![
        Cell::new("Slowest response"),
        Cell::new(format!("{:.1}s", results.slowest_time)),
    ]);
    table
}

/// Per-question history table.
pub fn history_table(results: &FinalResults) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Result",
        "Difficulty",
        "Multiplier",
        "Points",
        "Time",
        "Ability",
    ]);
    for h in &results.question_history {
        table.add_row(vec![
            Cell::new(h.question_num),
            Cell::new(if h.is_correct { "correct" } else { "incorrect" }),
            Cell::new(format!("{:.2}", h.difficulty)),
            Cell::new(format!("{:.2}x", h.multiplier)),
            Cell::new(h.points_earned),
            Cell::new(format!("{:.1}s", h.time_taken)),
            Cell::new(format!("{:.2}", h.ability_after)),
        ]);
    }
    table
}

/// Full plain-text results: metrics, weak topics, history.
pub fn render_results(results: &FinalResults, bank_size: usize) -> String {
    let mut out = String::new();
    out.push_str("Test Results\n");
    out.push_str(&format!("{}\n\n", results_table(results, bank_size)));

    out.push_str("Areas for improvement:\n");
    if results.incorrect_topics.is_empty() {
        out.push_str("  Great job! No specific areas need improvement.\n");
    } else {
        for topic in &results.incorrect_topics {
            out.push_str(&format!("  - {topic}\n"));
        }
    }

    if !results.question_history.is_empty() {
        out.push_str(&format!("\n{}\n", history_table(results)));
    }
    out
}
