//! Command-line definitions.

use crate::llm::{parse_label, Relationship, Tone};
use clap::{Args, Parser, Subcommand};
use strum::IntoEnumIterator;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reply-coach", version, about = "Suggest a reply for a chat screenshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a reply from one or more screenshots
    Generate(GenerateArgs),
    /// Rework the last generated reply
    Refine {
        /// What to change, e.g. "shorter" or "add a joke"
        instruction: String,
    },
    /// Show plan and remaining free replies
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Set the pro flag (normally refreshed by the store integration)
    SetPro {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Manage saved contacts
    #[command(subcommand)]
    Contact(ContactCommand),
    /// Manage the writing-style profile
    #[command(subcommand)]
    Style(StyleCommand),
    /// Save the Gemini API key to the OS keychain
    SetKey { api_key: String },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Screenshot path; repeat for multi-screenshot conversations (oldest first)
    #[arg(short, long = "image", required = true)]
    pub images: Vec<PathBuf>,
    #[arg(short, long, value_parser = parse_relationship, default_value = "friend")]
    pub relationship: Relationship,
    #[arg(short, long, value_parser = parse_tone, default_value = "friendly")]
    pub tone: Tone,
    /// Backstory or extra instructions
    #[arg(short, long)]
    pub context: Option<String>,
    /// Saved contact id; its relationship, tone and notes take precedence
    #[arg(long)]
    pub contact: Option<String>,
    /// Write in the saved style profile instead of a tone
    #[arg(long)]
    pub use_style: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    /// Add or replace a contact
    Add {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        relationship: String,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List,
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
pub enum StyleCommand {
    /// Build a style profile from messages you wrote
    Analyze {
        #[arg(short, long = "sample")]
        samples: Vec<String>,
        /// File with one sample message per line
        #[arg(long)]
        samples_file: Option<PathBuf>,
    },
    Show,
    Clear,
}

fn parse_relationship(raw: &str) -> Result<Relationship, String> {
    parse_label(raw).ok_or_else(|| {
        format!("unknown relationship '{}' (expected one of: {})", raw, choices::<Relationship>())
    })
}

fn parse_tone(raw: &str) -> Result<Tone, String> {
    parse_label(raw)
        .ok_or_else(|| format!("unknown tone '{}' (expected one of: {})", raw, choices::<Tone>()))
}

/// Accepted spellings, e.g. `best-friend, friend, boss`.
fn choices<T: IntoEnumIterator + std::fmt::Display>() -> String {
    T::iter()
        .map(|v| v.to_string().to_lowercase().replace(' ', "-"))
        .collect::<Vec<_>>()
        .join(", ")
}
