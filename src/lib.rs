//! reply-coach — screenshot in, suggested reply out.
//!
//! This file only wires the domains together. No business logic lives here.
//!
//!   - entitlement/  — daily usage quota (check + record_usage)
//!   - llm/          — prompt composition + Gemini client
//!   - profiles.rs   — contact and style profile store
//!   - pipeline.rs   — ReplyService orchestration
//!   - settings.rs   — env/keychain configuration
//!   - cli.rs        — clap definitions
//!   - commands.rs   — command handlers

pub mod cli;
mod commands;
pub mod entitlement;
pub mod llm;
pub mod pipeline;
pub mod profiles;
pub mod settings;

use clap::Parser;
use entitlement::{EntitlementGate, JsonFileStore};
use llm::{GeminiClient, PromptComposer};
use pipeline::ReplyService;
use profiles::ProfileStore;
use settings::Settings;

/// Everything a command needs, built once per process.
pub struct AppState {
    pub settings: Settings,
    pub service: ReplyService<JsonFileStore, GeminiClient>,
    pub profiles: ProfileStore,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Self {
        let gate = EntitlementGate::load(JsonFileStore::in_dir(&settings.data_dir));
        let composer = PromptComposer::new(settings.device_language.clone());
        let client = GeminiClient::new(settings.api_key.clone(), settings.model.clone());
        let profiles = ProfileStore::in_dir(&settings.data_dir);
        Self {
            service: ReplyService::new(gate, composer, client),
            profiles,
            settings,
        }
    }
}

/// Entry point — called by the binary.
pub async fn run() -> Result<(), String> {
    settings::load_env_files();
    env_logger::init();

    let cli = cli::Cli::parse();
    let settings = Settings::from_env();
    log::info!(
        "[STARTUP] reply-coach {} — data dir {}",
        env!("CARGO_PKG_VERSION"),
        settings.data_dir.display()
    );

    let state = AppState::from_settings(settings);
    commands::dispatch(&state, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use entitlement::Remaining;

    #[test]
    fn environment_cannot_raise_the_free_limit() {
        let dir = std::env::temp_dir().join(format!("reply-coach-app-{}", std::process::id()));
        let data_dir = dir.to_string_lossy().to_string();
        let settings = Settings::from_lookup(|key| match key {
            "REPLY_COACH_DATA_DIR" => Some(data_dir.clone()),
            "REPLY_COACH_FREE_LIMIT" => Some("1000000".to_string()),
            _ => None,
        });

        let state = AppState::from_settings(settings);
        let gate = state.service.gate();
        assert_eq!(gate.free_limit(), entitlement::FREE_USAGE_LIMIT);
        assert_eq!(gate.check().remaining, Remaining::Count(3));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
