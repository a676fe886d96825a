//! Request/response types for reply generation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Who the user is replying to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case", ascii_case_insensitive)]
pub enum Relationship {
    Wife,
    Husband,
    Girlfriend,
    Boyfriend,
    Crush,
    Ex,
    BestFriend,
    Friend,
    Mother,
    Father,
    Sibling,
    Boss,
    Coworker,
    Stranger,
}

/// Desired tone of the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case", ascii_case_insensitive)]
pub enum Tone {
    Friendly,
    Flirty,
    Funny,
    Romantic,
    Professional,
    Casual,
    Sarcastic,
    Supportive,
    Apologetic,
    Confident,
    Polite,
    Direct,
    Witty,
}

/// Accepts "best-friend", "best_friend", "Best Friend", "BEST FRIEND".
pub fn parse_label<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let normalized = raw.trim().replace(['-', '_'], " ");
    normalized.parse().ok()
}

/// One generation request as submitted by the user.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Screenshot bytes (PNG/JPEG/WebP/GIF), oldest first.
    pub images: Vec<Vec<u8>>,
    pub relationship: Relationship,
    pub tone: Tone,
    /// Previously computed description of the user's writing style.
    pub style_profile: Option<String>,
    /// Use `style_profile` instead of `tone`. Ignored when no profile is set.
    pub use_style: bool,
    pub context_text: Option<String>,
    /// Notes from the selected contact profile.
    pub contact_notes: Option<String>,
}

impl GenerationRequest {
    pub fn new(images: Vec<Vec<u8>>, relationship: Relationship, tone: Tone) -> Self {
        Self {
            images,
            relationship,
            tone,
            style_profile: None,
            use_style: false,
            context_text: None,
            contact_notes: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_text = Some(context.into());
        self
    }

    pub fn with_style(mut self, style_profile: impl Into<String>) -> Self {
        self.style_profile = Some(style_profile.into());
        self.use_style = true;
        self
    }

    pub fn with_contact_notes(mut self, notes: impl Into<String>) -> Self {
        self.contact_notes = Some(notes.into());
        self
    }

    /// Context with surrounding whitespace removed; `None` when blank.
    pub fn trimmed_context(&self) -> Option<&str> {
        non_empty(self.context_text.as_deref())
    }
}

/// Saved preferences for a specific person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactProfile {
    pub name: String,
    pub relationship: String,
    #[serde(default)]
    pub preferred_tone: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl ContactProfile {
    /// Relationship and tone after applying this profile's overrides.
    pub fn resolve(&self, relationship: &str, tone: &str) -> (String, String) {
        let relationship = non_empty(Some(self.relationship.as_str())).unwrap_or(relationship);
        let tone = non_empty(self.preferred_tone.as_deref()).unwrap_or(tone);
        (relationship.to_string(), tone.to_string())
    }
}

/// Relationship, tone, and notes handed to the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub relationship: String,
    pub tone: String,
    pub contact_notes: Option<String>,
}

/// Apply an optional contact profile on top of the manual selection.
///
/// Profile notes win over notes carried on the request.
pub fn resolve_selection(
    request: &GenerationRequest,
    contact: Option<&ContactProfile>,
) -> ResolvedSelection {
    let relationship = request.relationship.to_string();
    let tone = request.tone.to_string();
    match contact {
        Some(profile) => {
            let (relationship, tone) = profile.resolve(&relationship, &tone);
            let notes = non_empty(Some(profile.notes.as_str()))
                .or_else(|| non_empty(request.contact_notes.as_deref()))
                .map(str::to_string);
            ResolvedSelection {
                relationship,
                tone,
                contact_notes: notes,
            }
        }
        None => ResolvedSelection {
            relationship,
            tone,
            contact_notes: non_empty(request.contact_notes.as_deref()).map(str::to_string),
        },
    }
}

/// Which inference call shape to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    SingleImage,
    MultiImage,
    SingleImageStyled,
    MultiImageStyled,
}

impl Variant {
    pub fn select(styled: bool, image_count: usize) -> Self {
        match (styled, image_count > 1) {
            (false, false) => Variant::SingleImage,
            (false, true) => Variant::MultiImage,
            (true, false) => Variant::SingleImageStyled,
            (true, true) => Variant::MultiImageStyled,
        }
    }

    pub fn is_styled(self) -> bool {
        matches!(self, Variant::SingleImageStyled | Variant::MultiImageStyled)
    }

    pub fn is_multi_image(self) -> bool {
        matches!(self, Variant::MultiImage | Variant::MultiImageStyled)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Variant::SingleImage => "single-image",
            Variant::MultiImage => "multi-image",
            Variant::SingleImageStyled => "single-image-styled",
            Variant::MultiImageStyled => "multi-image-styled",
        };
        f.write_str(label)
    }
}

/// Everything the inference client needs for one call.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub images: Vec<Vec<u8>>,
    pub prompt_text: String,
    pub variant: Variant,
}

pub(crate) fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn category_counts() {
        assert_eq!(Relationship::iter().count(), 14);
        assert_eq!(Tone::iter().count(), 13);
    }

    #[test]
    fn labels_are_title_case() {
        assert_eq!(Relationship::BestFriend.to_string(), "Best Friend");
        assert_eq!(Tone::Professional.to_string(), "Professional");
    }

    #[test]
    fn parse_label_accepts_cli_spellings() {
        assert_eq!(parse_label::<Relationship>("best-friend"), Some(Relationship::BestFriend));
        assert_eq!(parse_label::<Relationship>("BOSS"), Some(Relationship::Boss));
        assert_eq!(parse_label::<Tone>(" witty "), Some(Tone::Witty));
        assert_eq!(parse_label::<Tone>("grumpy"), None);
    }

    #[test]
    fn contact_overrides_relationship_and_tone() {
        let request = GenerationRequest::new(vec![vec![1]], Relationship::Friend, Tone::Casual);
        let contact = ContactProfile {
            name: "Dana".to_string(),
            relationship: "Landlord".to_string(),
            preferred_tone: Some("Polite".to_string()),
            notes: "Rent is due on the 1st".to_string(),
        };
        let resolved = resolve_selection(&request, Some(&contact));
        assert_eq!(resolved.relationship, "Landlord");
        assert_eq!(resolved.tone, "Polite");
        assert_eq!(resolved.contact_notes.as_deref(), Some("Rent is due on the 1st"));
    }

    #[test]
    fn contact_without_preferred_tone_keeps_manual_tone() {
        let request = GenerationRequest::new(vec![vec![1]], Relationship::Friend, Tone::Funny);
        let contact = ContactProfile {
            name: "Sam".to_string(),
            relationship: "Coworker".to_string(),
            preferred_tone: Some("  ".to_string()),
            notes: String::new(),
        };
        let resolved = resolve_selection(&request, Some(&contact));
        assert_eq!(resolved.relationship, "Coworker");
        assert_eq!(resolved.tone, "Funny");
        assert_eq!(resolved.contact_notes, None);
    }

    #[test]
    fn no_contact_uses_manual_selection() {
        let request = GenerationRequest::new(vec![vec![1]], Relationship::Boss, Tone::Professional)
            .with_contact_notes("   ");
        let resolved = resolve_selection(&request, None);
        assert_eq!(resolved.relationship, "Boss");
        assert_eq!(resolved.tone, "Professional");
        assert_eq!(resolved.contact_notes, None);
    }

    #[test]
    fn variant_selection() {
        assert_eq!(Variant::select(false, 1), Variant::SingleImage);
        assert_eq!(Variant::select(false, 2), Variant::MultiImage);
        assert_eq!(Variant::select(true, 1), Variant::SingleImageStyled);
        assert_eq!(Variant::select(true, 3), Variant::MultiImageStyled);
        assert_eq!(Variant::MultiImageStyled.to_string(), "multi-image-styled");
    }
}
