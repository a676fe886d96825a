//! Reply pipeline — quota gate → compose → inference → record usage.
//!
//! `ReplyService` is constructed explicitly and owns its collaborators;
//! there is no global state. Stages:
//!   1. `EntitlementGate::check()` — refuse before any network call
//!   2. tier image limit + contact overrides + `PromptComposer::build()`
//!   3. `InferenceClient::generate()`
//!   4. `EntitlementGate::record_usage()` — only after a successful reply

use crate::entitlement::{EntitlementGate, EntitlementStore, UsageCheck};
use crate::llm::{
    resolve_selection, ComposeError, ComposedPrompt, ContactProfile, GenerationRequest,
    InferenceClient, InferenceError, PromptComposer, Variant,
};
use crate::profiles::StyleProfile;

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("Daily limit of {limit} free replies reached — upgrade to pro or try again tomorrow")]
    QuotaExceeded { limit: u32 },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<ComposeError> for ReplyError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::InvalidRequest(msg) => ReplyError::InvalidRequest(msg),
        }
    }
}

/// A generated reply plus what was sent to get it.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub reply: String,
    pub prompt: ComposedPrompt,
    /// Quota after this reply was recorded.
    pub usage: UsageCheck,
}

impl ReplyOutcome {
    pub fn variant(&self) -> Variant {
        self.prompt.variant
    }
}

pub struct ReplyService<S: EntitlementStore, C: InferenceClient> {
    gate: EntitlementGate<S>,
    composer: PromptComposer,
    client: C,
}

impl<S: EntitlementStore, C: InferenceClient> ReplyService<S, C> {
    pub fn new(gate: EntitlementGate<S>, composer: PromptComposer, client: C) -> Self {
        Self {
            gate,
            composer,
            client,
        }
    }

    pub fn gate(&self) -> &EntitlementGate<S> {
        &self.gate
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn status(&self) -> UsageCheck {
        self.gate.check()
    }

    /// Generate a reply. Quota is consumed only when the model answers.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        contact: Option<&ContactProfile>,
    ) -> Result<ReplyOutcome, ReplyError> {
        let pipeline_start = std::time::Instant::now();

        self.ensure_allowed()?;
        self.ensure_image_limit(request.images.len())?;

        let selection = resolve_selection(request, contact);
        if let Some(c) = contact {
            log::info!(
                "[PIPELINE] Contact '{}': relationship={}, tone={}",
                c.name,
                selection.relationship,
                selection.tone
            );
        }
        let prompt = self.composer.build(
            request,
            &selection.relationship,
            &selection.tone,
            request.style_profile.as_deref(),
            selection.contact_notes.as_deref(),
        )?;

        let reply = self.client.generate(&prompt).await.map_err(|e| {
            log::warn!("[PIPELINE] Inference failed, usage not recorded: {}", e);
            e
        })?;

        self.gate.record_usage();
        let usage = self.gate.check();
        log::info!(
            "[PIPELINE] Reply ready in {}ms ({} chars, variant={}, remaining={})",
            pipeline_start.elapsed().as_millis(),
            reply.len(),
            prompt.variant,
            usage.remaining
        );

        Ok(ReplyOutcome {
            reply,
            prompt,
            usage,
        })
    }

    /// Ask for a reworked reply. Counts as one generation.
    pub async fn refine(
        &self,
        prompt: &ComposedPrompt,
        previous_reply: &str,
        instruction: &str,
    ) -> Result<String, ReplyError> {
        self.ensure_allowed()?;
        self.ensure_image_limit(prompt.images.len())?;
        if instruction.trim().is_empty() {
            return Err(ReplyError::InvalidRequest(
                "refine instruction is empty".to_string(),
            ));
        }

        let reply = self
            .client
            .refine(prompt, previous_reply, instruction)
            .await?;
        self.gate.record_usage();
        Ok(reply)
    }

    /// Turn writing samples into a style profile. Does not use quota.
    pub async fn analyze_style(&self, samples: &[String]) -> Result<StyleProfile, ReplyError> {
        let message = self.composer.build_style_analysis(samples)?;
        let description = self.client.analyze_text(&message).await?;
        let sample_count = samples.iter().filter(|s| !s.trim().is_empty()).count();
        log::info!(
            "[PIPELINE] Style profile from {} samples ({} chars)",
            sample_count,
            description.len()
        );
        Ok(StyleProfile {
            description,
            sample_count,
            updated_on: chrono::Local::now().date_naive(),
        })
    }

    fn ensure_allowed(&self) -> Result<(), ReplyError> {
        let check = self.gate.check();
        if !check.allowed {
            log::info!("[PIPELINE] Quota exceeded — request refused before dispatch");
            return Err(ReplyError::QuotaExceeded {
                limit: self.gate.free_limit(),
            });
        }
        Ok(())
    }

    /// Screenshot limit for the current plan.
    fn ensure_image_limit(&self, count: usize) -> Result<(), ReplyError> {
        let max_images = self.gate.max_images();
        if count > max_images {
            return Err(ReplyError::InvalidRequest(format!(
                "your plan allows {} screenshot(s) per request, got {}",
                max_images, count
            )));
        }
        Ok(())
    }
}
