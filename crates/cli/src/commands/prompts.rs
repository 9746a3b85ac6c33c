//! Prompts command handler.

use clap::Args;
use docqa_core::config::AppConfig;
use docqa_prompt::list_prompts;

/// List available prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let entries = list_prompts(&config.workspace)?;

        if self.json {
            let output: Vec<_> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "id": entry.id,
                        "title": entry.title,
                        "source": entry.source.as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for entry in &entries {
                println!(
                    "{:<24} {:<10} {}",
                    entry.id,
                    entry.source.as_str(),
                    entry.title
                );
            }
        }

        Ok(())
    }
}
