// ABOUTME: Bootstrap wizard for aviary configuration.
// ABOUTME: Guides user through provider choice, system prompt, and first agent.

use anyhow::{Context, Result};
use aviary_core::{Config, StartupAgent};
use std::io::{self, Write};

fn prompt(message: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", message, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim();
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.to_string())
    }
}

fn prompt_choice(message: &str, choices: &[&str], default: usize) -> Result<usize> {
    println!("{}:", message);
    for (i, choice) in choices.iter().enumerate() {
        let marker = if i == default { "*" } else { " " };
        println!("  {} [{}] {}", marker, i + 1, choice);
    }

    print!("Choice [{}]: ", default + 1);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim();
    if input.is_empty() {
        Ok(default)
    } else {
        let choice: usize = input.parse().context("Invalid choice")?;
        if choice < 1 || choice > choices.len() {
            anyhow::bail!("Choice must be between 1 and {}", choices.len());
        }
        Ok(choice - 1)
    }
}

pub fn run_init() -> Result<()> {
    println!("aviary initialization\n");

    let provider_choices = ["placeholder", "echo"];
    let provider_idx = prompt_choice("Default provider", &provider_choices, 0)?;
    let default_provider = provider_choices[provider_idx].to_string();

    let default_system_prompt = prompt(
        "Default system prompt",
        aviary_core::types::DEFAULT_SYSTEM_PROMPT,
    )?;

    let first_agent = prompt("First agent id (empty for none)", "")?;
    let agents = if first_agent.is_empty() {
        Vec::new()
    } else {
        vec![StartupAgent {
            agent_id: first_agent,
            provider: None,
            system_prompt: None,
            tools: Vec::new(),
        }]
    };

    let config = Config {
        default_provider,
        default_system_prompt,
        agents,
        ..Default::default()
    };

    let config_path = Config::default_path()?;
    config.save(&config_path)?;
    println!("\nConfig written to {}", config_path.display());

    println!("\nReady to run: aviary run");

    Ok(())
}
