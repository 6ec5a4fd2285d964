//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, seed, config) and shared utilities (open_db, load_config)
//! - `export` - Sales report export
//! - `insights` - AI insight generation
//! - `prompts` - Prompt library management commands
//! - `reports` - Report rendering (sales, customers, products, seasonal)
//! - `serve` - Web server command

pub mod core;
pub mod export;
pub mod insights;
pub mod prompts;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use export::*;
pub use insights::*;
pub use prompts::*;
pub use reports::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
