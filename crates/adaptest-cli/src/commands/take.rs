//! The `adaptest take` command: an interactive adaptive test on stdin/stdout.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use adaptest_core::bank::load_bank;
use adaptest_core::engine::{multiplier_for, AdaptiveEngine, ServedQuestion};
use adaptest_core::report::SessionReport;
use adaptest_providers::config::load_config_from;
use adaptest_report::html::write_html_report;

use crate::commands::generate::bank_from_document;
use crate::display::render_results;

/// Where the question bank comes from.
pub enum BankSource {
    File(PathBuf),
    Document(PathBuf),
}

pub struct TakeOptions {
    pub source: BankSource,
    pub output: Option<PathBuf>,
    pub format: String,
    pub no_save: bool,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub config: Option<PathBuf>,
}

/// How a single pass through the quiz ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every question was served and answered.
    Completed,
    /// Input ended before the bank was exhausted.
    Abandoned,
}

pub async fn execute(opts: TakeOptions) -> Result<()> {
    let formats = parse_formats(&opts.format)?;
    let config = load_config_from(opts.config.as_deref())?;

    let (bank, source) = match &opts.source {
        BankSource::File(path) => (load_bank(path)?, display_name(path)),
        BankSource::Document(path) => {
            let bank = bank_from_document(
                &config,
                path,
                opts.model.as_deref(),
                opts.provider.as_deref(),
            )
            .await?;
            (bank, display_name(path))
        }
    };
    anyhow::ensure!(!bank.is_empty(), "question bank has no questions");

    let output_dir = opts.output.unwrap_or(config.output_dir);
    let mut engine = AdaptiveEngine::new(bank);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut out = stdout.lock();

    loop {
        let end = run_session(&mut engine, &mut input, &mut out)?;
        let results = engine.get_final_results();

        if end == SessionEnd::Abandoned {
            writeln!(
                out,
                "\nSession abandoned after {} question(s).",
                engine.questions_attempted()
            )?;
            if let Some(results) = &results {
                write!(out, "{}", render_results(results, engine.bank().len()))?;
            }
            return Ok(());
        }

        let Some(results) = results else {
            writeln!(out, "No questions were answered.")?;
            return Ok(());
        };

        writeln!(out)?;
        write!(out, "{}", render_results(&results, engine.bank().len()))?;

        if !opts.no_save {
            let report = SessionReport::new(source.clone(), engine.bank().len(), results);
            for path in save_reports(&report, &output_dir, &formats)? {
                writeln!(out, "Saved: {}", path.display())?;
            }
        }

        if !prompt_restart(&mut input, &mut out)? {
            return Ok(());
        }
        engine.reset();
    }
}

/// Run one pass through the bank, reading answer labels from `input`.
pub fn run_session<R: BufRead, W: Write>(
    engine: &mut AdaptiveEngine,
    input: &mut R,
    out: &mut W,
) -> Result<SessionEnd> {
    let total = engine.bank().len();

    while let Some(served) = engine.select_next_question() {
        let question_num = engine.questions_attempted() + 1;
        show_question(out, &served, question_num, total)?;

        let start = Instant::now();
        let Some(label) = read_label(&served, input, out)? else {
            return Ok(SessionEnd::Abandoned);
        };
        let time_taken = start.elapsed().as_secs_f64();

        let question = &served.question;
        let is_correct = question.is_correct(&label);
        let outcome = engine.process_answer(is_correct, time_taken, question.difficulty);

        if is_correct {
            writeln!(out, "Correct! +{} points", outcome.points_earned)?;
        } else {
            writeln!(
                out,
                "Incorrect. The correct answer was {}) {}",
                question.correct_answer,
                question.correct_option_text().unwrap_or_default()
            )?;
        }
        if !question.explanation.is_empty() {
            writeln!(out, "Explanation: {}", question.explanation)?;
        }
        writeln!(
            out,
            "Score: {} | Ability: {:.2} | Next difficulty: {:.2} | Time: {:.1}s\n",
            outcome.total_points, outcome.user_ability, outcome.current_difficulty, time_taken
        )?;
    }

    Ok(SessionEnd::Completed)
}

fn show_question<W: Write>(
    out: &mut W,
    served: &ServedQuestion,
    question_num: u32,
    total: usize,
) -> Result<()> {
    let q = &served.question;
    writeln!(
        out,
        "Question {question_num} of {total} | Difficulty: {:.2} | Topic: {} | Points multiplier: {:.2}x",
        q.difficulty,
        q.topic,
        multiplier_for(q.difficulty)
    )?;
    writeln!(out, "{}", q.text)?;
    for (label, text) in &q.options {
        writeln!(out, "  {label}) {text}")?;
    }
    Ok(())
}

/// Prompt until the input names one of the question's options. `None` on EOF.
fn read_label<R: BufRead, W: Write>(
    served: &ServedQuestion,
    input: &mut R,
    out: &mut W,
) -> Result<Option<String>> {
    let labels: Vec<&str> = served.question.options.keys().map(String::as_str).collect();
    loop {
        write!(out, "Your answer ({}): ", labels.join("/"))?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match served.question.resolve_label(&line) {
            Some(label) => return Ok(Some(label.to_string())),
            None => writeln!(out, "Please enter one of: {}", labels.join(", "))?,
        }
    }
}

fn prompt_restart<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "\nRestart test? [y/N]: ")?;
    out.flush()?;
    let answer = read_line(input)?.unwrap_or_default();
    let restart = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    if restart {
        writeln!(out)?;
    }
    Ok(restart)
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_formats(format: &str) -> Result<Vec<&'static str>> {
    if format.trim() == "all" {
        return Ok(vec!["json", "html", "markdown"]);
    }
    format
        .split(',')
        .map(|f| match f.trim() {
            "json" => Ok("json"),
            "html" => Ok("html"),
            "markdown" | "md" => Ok("markdown"),
            other => anyhow::bail!("unknown report format '{other}' (expected json, html, markdown, all)"),
        })
        .collect()
}

fn save_reports(report: &SessionReport, dir: &Path, formats: &[&str]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    // Sessions restarted within the same second share a timestamp
    let id = report.id.simple().to_string();
    let stem = format!(
        "session-{}-{}",
        report.created_at.format("%Y-%m-%dT%H%M%S"),
        &id[..8]
    );

    let mut written = Vec::new();
    for fmt in formats {
        let path = match *fmt {
            "json" => {
                let path = dir.join(format!("{stem}.json"));
                report.save_json(&path)?;
                path
            }
            "html" => {
                let path = dir.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                path
            }
            _ => {
                let path = dir.join(format!("{stem}.md"));
                std::fs::write(&path, report.to_markdown())?;
                path
            }
        };
        written.push(path);
    }
    Ok(written)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
