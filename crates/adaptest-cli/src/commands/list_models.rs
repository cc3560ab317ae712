//! The `adaptest list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_providers::create_provider;

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = adaptest_providers::config::load_config_from(config_path.as_deref())?;

    let mut names: Vec<&String> = config
        .providers
        .keys()
        .filter(|name| provider_filter.as_ref().is_none_or(|f| f == *name))
        .collect();
    names.sort();

    if names.is_empty() {
        match &provider_filter {
            Some(filter) => println!("Provider '{filter}' is not configured."),
            None => {
                println!("No providers configured. Run `adaptest init` or set OR_API_KEY.")
            }
        }
        return Ok(());
    }

    for name in names {
        let provider = create_provider(name, &config.providers[name])?;
        println!("Provider: {name}");
        match provider.available_models().await {
            Ok(models) if models.is_empty() => println!("  (no models found)"),
            Ok(models) => {
                for model in &models {
                    if model.max_context > 0 {
                        println!(
                            "  {} ({}, {}K context)",
                            model.id,
                            model.name,
                            model.max_context / 1000
                        );
                    } else {
                        println!("  {}", model.id);
                    }
                }
            }
            Err(e) => println!("  unavailable: {e:#}"),
        }
        println!();
    }

    Ok(())
}
