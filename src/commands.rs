//! Command handlers.
//!
//! Thin wrappers that bridge CLI arguments to the services in AppState.
//! Each handler does one thing and reports errors as strings.
//!
//! The last generated reply is kept in `{data_dir}/last-reply.json` so
//! `refine` can continue the conversation in a later process.

use crate::cli::{Command, ContactCommand, GenerateArgs, StyleCommand};
use crate::llm::provider::GEMINI;
use crate::llm::{ComposedPrompt, ContactProfile, GenerationRequest, Variant};
use crate::AppState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LAST_REPLY_FILE: &str = "last-reply.json";

/// Enough of the last generation to re-send it with a follow-up instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastReply {
    image_paths: Vec<PathBuf>,
    prompt_text: String,
    variant: Variant,
    reply: String,
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<(), String> {
    match command {
        Command::Generate(args) => generate(state, args).await,
        Command::Refine { instruction } => refine(state, &instruction).await,
        Command::Status { json } => status(state, json),
        Command::SetPro { enabled } => set_pro(state, enabled),
        Command::Contact(cmd) => contact(state, cmd),
        Command::Style(cmd) => style(state, cmd).await,
        Command::SetKey { api_key } => {
            crate::settings::save_api_key(&api_key)?;
            println!("API key saved to the OS keychain.");
            Ok(())
        }
    }
}

async fn generate(state: &AppState, args: GenerateArgs) -> Result<(), String> {
    let images = read_images(&args.images).await?;
    let book = state.profiles.load();

    let contact = match &args.contact {
        Some(id) => Some(
            book.contact(id)
                .cloned()
                .ok_or_else(|| format!("No saved contact '{}'", id))?,
        ),
        None => None,
    };

    let mut request = GenerationRequest::new(images, args.relationship, args.tone);
    request.context_text = args.context;
    if args.use_style {
        request.use_style = true;
        request.style_profile = book.style().map(|s| s.description.clone());
        if request.style_profile.is_none() {
            eprintln!("No style profile saved yet, using tone. Run `reply-coach style analyze`.");
        }
    }

    let outcome = state
        .service
        .generate(&request, contact.as_ref())
        .await
        .map_err(|e| e.to_string())?;

    let last = LastReply {
        image_paths: args.images,
        prompt_text: outcome.prompt.prompt_text.clone(),
        variant: outcome.variant(),
        reply: outcome.reply.clone(),
    };
    if let Err(e) = save_last_reply(&state.settings.data_dir, &last) {
        log::warn!("[COMMANDS] Could not save last reply: {}", e);
    }

    if args.json {
        let out = serde_json::json!({
            "reply": outcome.reply,
            "variant": outcome.variant(),
            "usage": outcome.usage,
        });
        println!("{}", serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?);
    } else {
        println!("{}", outcome.reply);
        eprintln!("({} · remaining today: {})", outcome.variant(), outcome.usage.remaining);
    }
    Ok(())
}

async fn refine(state: &AppState, instruction: &str) -> Result<(), String> {
    let mut last = load_last_reply(&state.settings.data_dir)
        .ok_or("Nothing to refine — run `reply-coach generate` first")?;
    let images = read_images(&last.image_paths).await?;
    let prompt = ComposedPrompt {
        images,
        prompt_text: last.prompt_text.clone(),
        variant: last.variant,
    };

    let reply = state
        .service
        .refine(&prompt, &last.reply, instruction)
        .await
        .map_err(|e| e.to_string())?;

    last.reply = reply.clone();
    if let Err(e) = save_last_reply(&state.settings.data_dir, &last) {
        log::warn!("[COMMANDS] Could not save refined reply: {}", e);
    }
    println!("{}", reply);
    Ok(())
}

fn status(state: &AppState, json: bool) -> Result<(), String> {
    let check = state.service.status();
    let gate = state.service.gate();
    let client = state.service.client();
    if json {
        let out = serde_json::json!({
            "pro": gate.is_pro(),
            "allowed": check.allowed,
            "remaining": check.remaining,
            "maxImages": gate.max_images(),
            "provider": GEMINI.name,
            "model": client.model(),
            "apiKeyConfigured": client.has_api_key(),
        });
        println!("{}", serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?);
        return Ok(());
    }

    let plan = if gate.is_pro() { "pro" } else { "free" };
    println!("Plan:            {}", plan);
    println!("Remaining today: {}", check.remaining);
    println!("Screenshots:     up to {} per request", gate.max_images());
    println!("Model:           {} ({})", client.model(), GEMINI.name);
    println!(
        "API key:         {}",
        if client.has_api_key() { "configured" } else { "missing" }
    );
    Ok(())
}

fn set_pro(state: &AppState, enabled: bool) -> Result<(), String> {
    let gate = state.service.gate();
    gate.set_pro(enabled);
    if gate.has_pending_write() {
        return Err("Pro status changed for this run but could not be saved".to_string());
    }
    println!("Pro: {}", enabled);
    Ok(())
}

fn contact(state: &AppState, cmd: ContactCommand) -> Result<(), String> {
    let mut book = state.profiles.load();
    match cmd {
        ContactCommand::Add {
            id,
            name,
            relationship,
            tone,
            notes,
        } => {
            let profile = ContactProfile {
                name: name.unwrap_or_else(|| id.clone()),
                relationship,
                preferred_tone: tone,
                notes,
            };
            let replaced = book.upsert_contact(id.clone(), profile).is_some();
            state.profiles.save(&book).map_err(|e| e.to_string())?;
            println!("{} contact '{}'", if replaced { "Updated" } else { "Added" }, id);
        }
        ContactCommand::List => {
            let mut any = false;
            for (id, c) in book.contacts() {
                any = true;
                let tone = c.preferred_tone.as_deref().unwrap_or("-");
                println!(
                    "{:<16} {:<20} {:<14} {:<12} {}",
                    id, c.name, c.relationship, tone, c.notes
                );
            }
            if !any {
                println!("No saved contacts.");
            }
        }
        ContactCommand::Remove { id } => {
            if book.remove_contact(&id).is_none() {
                return Err(format!("No saved contact '{}'", id));
            }
            state.profiles.save(&book).map_err(|e| e.to_string())?;
            println!("Removed contact '{}'", id);
        }
    }
    Ok(())
}

async fn style(state: &AppState, cmd: StyleCommand) -> Result<(), String> {
    let mut book = state.profiles.load();
    match cmd {
        StyleCommand::Analyze {
            mut samples,
            samples_file,
        } => {
            if let Some(path) = samples_file {
                let raw = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                samples.extend(raw.lines().map(str::to_string));
            }
            let profile = state
                .service
                .analyze_style(&samples)
                .await
                .map_err(|e| e.to_string())?;
            println!("{}", profile.description);
            book.set_style(profile);
            state.profiles.save(&book).map_err(|e| e.to_string())?;
        }
        StyleCommand::Show => match book.style() {
            Some(style) => {
                println!("{}", style.description);
                eprintln!("({} samples, updated {})", style.sample_count, style.updated_on);
            }
            None => println!("No style profile saved."),
        },
        StyleCommand::Clear => {
            if book.clear_style().is_some() {
                state.profiles.save(&book).map_err(|e| e.to_string())?;
            }
            println!("Style profile cleared.");
        }
    }
    Ok(())
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>, String> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        log::info!("[COMMANDS] Loaded {} ({} bytes)", path.display(), bytes.len());
        images.push(bytes);
    }
    Ok(images)
}

fn save_last_reply(dir: &Path, last: &LastReply) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create data dir: {}", e))?;
    let json = serde_json::to_string_pretty(last)
        .map_err(|e| format!("Failed to serialize last reply: {}", e))?;
    std::fs::write(dir.join(LAST_REPLY_FILE), json)
        .map_err(|e| format!("Failed to write last reply: {}", e))
}

fn load_last_reply(dir: &Path) -> Option<LastReply> {
    let raw = std::fs::read_to_string(dir.join(LAST_REPLY_FILE)).ok()?;
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_reply_roundtrip_and_missing() {
        let dir = std::env::temp_dir().join(format!("reply-coach-last-{}", std::process::id()));
        assert!(load_last_reply(&dir).is_none());

        let last = LastReply {
            image_paths: vec![PathBuf::from("chat.png")],
            prompt_text: "prompt".to_string(),
            variant: Variant::SingleImageStyled,
            reply: "see you soon".to_string(),
        };
        save_last_reply(&dir, &last).unwrap();
        let loaded = load_last_reply(&dir).unwrap();
        assert_eq!(loaded.variant, Variant::SingleImageStyled);
        assert_eq!(loaded.reply, "see you soon");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
