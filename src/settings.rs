//! Runtime configuration and API key resolution.
//!
//! Handles:
//! - `.env.local` / `.env` loading
//! - API key lookup (env var first, then OS keychain via keyring)
//! - Model, reply language and data directory overrides

use crate::llm::{provider::GEMINI, DEFAULT_LANGUAGE, GEMINI_MODEL};
use std::path::PathBuf;

const KEYRING_SERVICE: &str = "reply-coach";

pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_LANGUAGE: &str = "REPLY_COACH_LANGUAGE";
pub const ENV_DATA_DIR: &str = "REPLY_COACH_DATA_DIR";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    /// Reply language when the user gives no context text.
    pub device_language: String,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Read settings from the process environment, falling back to the keychain
    /// for the API key.
    pub fn from_env() -> Self {
        let mut settings = Self::from_lookup(|key| std::env::var(key).ok());
        if settings.api_key.is_none() {
            settings.api_key = keychain_api_key();
        }
        settings
    }

    /// Build settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let device_language = get(ENV_LANGUAGE)
            .or_else(|| {
                ["LC_ALL", "LC_MESSAGES", "LANG"]
                    .iter()
                    .find_map(|k| get(*k))
                    .and_then(|locale| language_from_locale(&locale))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Self {
            api_key: get(GEMINI.env_key),
            model: get(ENV_MODEL).unwrap_or_else(|| GEMINI_MODEL.to_string()),
            device_language,
            data_dir: get(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        }
    }
}

/// Load `.env.local`, else `.env`, from the working directory.
///
/// Runs before the logger exists, so it reports on stderr directly.
pub fn load_env_files() {
    'env_load: for env_file in [".env.local", ".env"] {
        let path = PathBuf::from(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }
}

/// `~/.local/share/reply-coach` (or the platform equivalent).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reply-coach")
}

/// Read the API key from the OS keychain.
fn keychain_api_key() -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, GEMINI.id).ok()?;
    match entry.get_password() {
        Ok(key) if !key.is_empty() => {
            log::info!("[SETTINGS] Loaded {} key from OS keychain", GEMINI.id);
            Some(key)
        }
        _ => None,
    }
}

/// Save the API key to the OS keychain.
pub fn save_api_key(api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key is empty".to_string());
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, GEMINI.id)
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(api_key.trim())
        .map_err(|e| format!("Failed to save key: {}", e))?;
    log::info!("[SETTINGS] API key saved for provider: {}", GEMINI.id);
    Ok(())
}

/// Map a POSIX locale ("de_DE.UTF-8") to a language name the model understands.
pub fn language_from_locale(locale: &str) -> Option<&'static str> {
    let code = locale
        .split(['_', '.', '@', '-'])
        .next()?
        .to_ascii_lowercase();
    let name = match code.as_str() {
        "en" => "English",
        "de" => "German",
        "es" => "Spanish",
        "fr" => "French",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "ru" => "Russian",
        "uk" => "Ukrainian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "sv" => "Swedish",
        _ => return None,
    };
    Some(name)
}
