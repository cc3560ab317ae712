//! The `adaptest init` command.

use std::path::Path;

use anyhow::Result;

use adaptest_providers::config::LOCAL_CONFIG_FILE;

pub fn execute() -> Result<()> {
    if Path::new(LOCAL_CONFIG_FILE).exists() {
        println!("{LOCAL_CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(LOCAL_CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {LOCAL_CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Put your OpenRouter key in OR_API_KEY (or a .env file)");
    println!("  2. Run: adaptest generate --document notes.txt --output bank.json");
    println!("  3. Run: adaptest take --bank bank.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

default_provider = "openrouter"
default_model = "openai/gpt-4o-mini"
temperature = 0.7
max_retries = 2
retry_delay_ms = 1000
# Only the leading words of a document are sent to the model
max_words = 1000
question_count = 20
output_dir = "./adaptest-results"

[providers.openrouter]
type = "openrouter"
api_key = "${OR_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;
