//! PromptComposer — turns a `GenerationRequest` into a `ComposedPrompt`.

use super::prompts;
use super::types::{non_empty, ComposedPrompt, GenerationRequest, Variant};

/// Most screenshots a single request may carry.
pub const MAX_IMAGES: usize = 5;

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    device_language: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl PromptComposer {
    /// `device_language` is used when the user gives no context text.
    pub fn new(device_language: impl Into<String>) -> Self {
        let device_language = device_language.into();
        let device_language = match non_empty(Some(device_language.as_str())) {
            Some(lang) => lang.to_string(),
            None => DEFAULT_LANGUAGE.to_string(),
        };
        Self { device_language }
    }

    pub fn device_language(&self) -> &str {
        &self.device_language
    }

    /// Build the prompt text, image set and call variant.
    ///
    /// `style_profile` is only used when `request.use_style` is set; a set
    /// flag without a profile falls back to the toned variant.
    pub fn build(
        &self,
        request: &GenerationRequest,
        resolved_relationship: &str,
        resolved_tone: &str,
        style_profile: Option<&str>,
        contact_notes: Option<&str>,
    ) -> Result<ComposedPrompt, ComposeError> {
        if request.images.is_empty() {
            return Err(ComposeError::InvalidRequest(
                "at least one screenshot is required".to_string(),
            ));
        }
        if request.images.len() > MAX_IMAGES {
            return Err(ComposeError::InvalidRequest(format!(
                "at most {} screenshots per request, got {}",
                MAX_IMAGES,
                request.images.len()
            )));
        }
        if let Some(i) = request.images.iter().position(|img| img.is_empty()) {
            return Err(ComposeError::InvalidRequest(format!("screenshot {} is empty", i + 1)));
        }

        let style = if request.use_style { non_empty(style_profile) } else { None };
        if request.use_style && style.is_none() {
            log::warn!("[COMPOSE] Style requested but no style profile set — using tone");
        }
        let variant = Variant::select(style.is_some(), request.images.len());
        let multi = variant.is_multi_image();
        let context = request.trimmed_context();

        let mut sections: Vec<String> = Vec::with_capacity(6);
        sections.push(prompts::base_instruction(multi));
        match style {
            Some(style) => sections.push(prompts::style_directive(style)),
            None => sections.push(prompts::tone_directive(resolved_relationship, resolved_tone)),
        }
        sections.push(prompts::language_directive(context.is_some(), &self.device_language));
        if let Some(notes) = non_empty(contact_notes) {
            sections.push(prompts::contact_notes_block(notes));
        }
        if let Some(context) = context {
            sections.push(prompts::context_block(context));
        }
        sections.push(prompts::closing_instruction(multi).to_string());

        let prompt_text = sections.join("\n\n");
        log::info!(
            "[COMPOSE] Variant: {}, images: {}, prompt: {} chars",
            variant,
            request.images.len(),
            prompt_text.len()
        );

        Ok(ComposedPrompt {
            images: request.images.clone(),
            prompt_text,
            variant,
        })
    }

    /// Style-analysis prompt from the user's writing samples.
    pub fn build_style_analysis(&self, samples: &[String]) -> Result<String, ComposeError> {
        let usable = samples.iter().filter(|s| !s.trim().is_empty()).count();
        if usable < prompts::MIN_STYLE_SAMPLES {
            return Err(ComposeError::InvalidRequest(format!(
                "need at least {} writing samples, got {}",
                prompts::MIN_STYLE_SAMPLES,
                usable
            )));
        }
        Ok(prompts::build_style_analysis_message(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{Relationship, Tone};

    fn request(images: usize) -> GenerationRequest {
        GenerationRequest::new(
            vec![vec![0x89, b'P', b'N', b'G']; images],
            Relationship::Boss,
            Tone::Professional,
        )
    }

    fn build(composer: &PromptComposer, req: &GenerationRequest) -> ComposedPrompt {
        let rel = req.relationship.to_string();
        let tone = req.tone.to_string();
        composer
            .build(req, &rel, &tone, req.style_profile.as_deref(), req.contact_notes.as_deref())
            .unwrap()
    }

    #[test]
    fn empty_images_is_invalid() {
        let composer = PromptComposer::default();
        let err = composer
            .build(&request(0), "boss", "professional", None, None)
            .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidRequest(_)));
    }

    #[test]
    fn too_many_images_is_invalid() {
        let composer = PromptComposer::default();
        assert!(composer.build(&request(6), "boss", "casual", None, None).is_err());
        assert!(composer.build(&request(5), "boss", "casual", None, None).is_ok());
    }

    #[test]
    fn blank_image_is_invalid() {
        let composer = PromptComposer::default();
        let mut req = request(2);
        req.images[1].clear();
        let err = composer.build(&req, "boss", "casual", None, None).unwrap_err();
        assert_eq!(err, ComposeError::InvalidRequest("screenshot 2 is empty".to_string()));
    }

    #[test]
    fn output_is_deterministic() {
        let composer = PromptComposer::new("Spanish");
        let req = request(2)
            .with_context("  she asked about dinner  ")
            .with_contact_notes("Vegetarian");
        let a = build(&composer, &req);
        let b = build(&composer, &req);
        assert_eq!(a.prompt_text, b.prompt_text);
        assert_eq!(a.variant, b.variant);
    }

    #[test]
    fn variant_follows_style_and_image_count() {
        let composer = PromptComposer::default();
        let styled = |n| build(&composer, &request(n).with_style("short, lowercase")).variant;
        assert_eq!(styled(1), Variant::SingleImageStyled);
        assert_eq!(styled(3), Variant::MultiImageStyled);
        assert_eq!(build(&composer, &request(2)).variant, Variant::MultiImage);
        assert_eq!(build(&composer, &request(1)).variant, Variant::SingleImage);
    }

    #[test]
    fn style_flag_without_profile_falls_back_to_tone() {
        let composer = PromptComposer::default();
        let mut req = request(1);
        req.use_style = true;
        let prompt = build(&composer, &req);
        assert_eq!(prompt.variant, Variant::SingleImage);
        assert!(prompt.prompt_text.contains("professional tone"));
    }

    #[test]
    fn profile_without_flag_is_ignored() {
        let composer = PromptComposer::default();
        let mut req = request(1);
        req.style_profile = Some("all caps".to_string());
        let prompt = build(&composer, &req);
        assert_eq!(prompt.variant, Variant::SingleImage);
        assert!(!prompt.prompt_text.contains("all caps"));
    }

    #[test]
    fn styled_prompt_replaces_tone_directive() {
        let composer = PromptComposer::default();
        let prompt = build(&composer, &request(1).with_style("Uses lots of emoji."));
        assert!(prompt.prompt_text.contains("Uses lots of emoji."));
        assert!(!prompt.prompt_text.contains("tone."));
        assert!(!prompt.prompt_text.contains("my boss"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let composer = PromptComposer::default();
        let req = request(1).with_context("   ").with_contact_notes("");
        let text = build(&composer, &req).prompt_text.to_lowercase();
        assert!(!text.contains("must remember"));
        assert!(!text.contains("additional context"));
        assert!(text.contains("reply in english."));
    }

    #[test]
    fn sections_appear_in_order() {
        let composer = PromptComposer::default();
        let req = request(1)
            .with_context("We argued yesterday")
            .with_contact_notes("Allergic to cats");
        let text = build(&composer, &req).prompt_text;

        let order = [
            text.find("You are a texting assistant").unwrap(),
            text.find("my boss").unwrap(),
            text.find("Language:").unwrap(),
            text.find("must remember").unwrap(),
            text.find("We argued yesterday").unwrap(),
            text.find("Analyze the screenshot now").unwrap(),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn blank_device_language_defaults_to_english() {
        assert_eq!(PromptComposer::new("  ").device_language(), "English");
    }

    #[test]
    fn style_analysis_needs_enough_samples() {
        let composer = PromptComposer::default();
        let two = vec!["a".to_string(), "b".to_string(), " ".to_string()];
        assert!(composer.build_style_analysis(&two).is_err());
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(composer.build_style_analysis(&three).is_ok());
    }
}
