//! The `adaptest generate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use adaptest_core::bank::{lint_bank, save_bank};
use adaptest_core::document::load_document;
use adaptest_core::generation::generate_question_bank;
use adaptest_core::model::QuestionBank;
use adaptest_providers::config::{load_config_from, AdaptestConfig};
use adaptest_providers::create_provider;

pub async fn execute(
    document: PathBuf,
    output: PathBuf,
    model: Option<String>,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = bank_from_document(&config, &document, model.as_deref(), provider.as_deref()).await?;

    save_bank(&bank, &output)?;
    println!(
        "Generated {} questions from {} -> {}",
        bank.len(),
        document.display(),
        output.display()
    );

    let warnings = lint_bank(&bank);
    if !warnings.is_empty() {
        println!(
            "{} warning(s); run `adaptest validate --bank {}` for details.",
            warnings.len(),
            output.display()
        );
    }

    Ok(())
}

/// Extract a document and turn it into a validated question bank.
pub async fn bank_from_document(
    config: &AdaptestConfig,
    document: &Path,
    model: Option<&str>,
    provider: Option<&str>,
) -> Result<QuestionBank> {
    let text = load_document(document)
        .with_context(|| format!("failed to read document {}", document.display()))?;

    let (name, provider_config) = config.provider(provider)?;
    tracing::debug!(provider = name, ?provider_config, "using provider");
    let provider = create_provider(name, provider_config)?;
    let generation = config.generation_config(model);

    eprintln!(
        "Generating {} questions with {} ({})...",
        generation.question_count,
        provider.name(),
        generation.model
    );
    generate_question_bank(provider.as_ref(), &text, &generation).await
}
