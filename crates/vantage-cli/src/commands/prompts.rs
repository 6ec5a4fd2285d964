//! Prompt library commands

use anyhow::Result;
use vantage_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// List all available prompts and their override status
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();

    println!("Available Prompts:\n");
    println!("{:<25} {:>7}  {}", "ID", "VERSION", "OVERRIDE");
    println!("{}", "-".repeat(50));

    for info in library.list() {
        let status = match info.override_path {
            Some(ref path) => format!("✓ {}", path.display()),
            None => "Default".to_string(),
        };
        println!("{:<25} {:>7}  {}", info.id, info.version, status);
    }

    println!();
    println!(
        "Override directory: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );
    println!("Copy a prompt there as <id>.md and edit it to customize insight generation.");

    Ok(())
}

/// Show the content of a prompt, as the insight generator would load it
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(&id) = PromptId::all().iter().find(|id| id.as_str() == prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        anyhow::bail!("Unknown prompt ID: {}. Available: {}", prompt_id, known.join(", "));
    };

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!("Task Type: {}", prompt.metadata.task_type);
    match prompt.override_path {
        Some(ref path) if prompt.is_override => println!("Source: Override ({})", path.display()),
        _ => println!("Source: Default"),
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}

/// Show the path where prompt overrides should be placed
pub fn cmd_prompts_path() -> Result<()> {
    match default_prompts_dir() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!();
                eprintln!("Note: This directory does not exist yet.");
            }
        }
        None => eprintln!("Could not determine prompts directory on this system."),
    }

    Ok(())
}
