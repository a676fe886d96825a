//! Prompt text for reply generation and style analysis.
//!
//! These strings are the contract between reply-coach and the model.
//! Everything here is deterministic: no timestamps, no randomness.

/// Instruction sent when the user asks to tweak a reply they already got.
pub const REFINE_PREAMBLE: &str = "Rewrite your previous reply following this instruction. \
Respond with only the new reply text.";

/// Minimum number of writing samples for a style analysis.
pub const MIN_STYLE_SAMPLES: usize = 3;

/// Task description. The wording depends only on whether there is more
/// than one screenshot.
pub fn base_instruction(multi_image: bool) -> String {
    let source = if multi_image {
        "I am sending you several screenshots of one chat conversation, in chronological order \
         (the first image is the oldest)."
    } else {
        "I am sending you a screenshot of a chat conversation."
    };
    format!(
        "You are a texting assistant. {source} Read the conversation and write the next message I should send.\n\
         Respond with ONLY the reply text. No explanations, no quotation marks, no alternatives, no labels.\n\
         The reply must sound natural and conversational, like a real person texting."
    )
}

/// Relationship + tone directive for the toned variants.
pub fn tone_directive(relationship: &str, tone: &str) -> String {
    let tone = tone.trim().to_lowercase();
    format!(
        "The person I am replying to is my {}.\nWrite the reply in {} {} tone.",
        relationship.trim().to_lowercase(),
        indefinite_article(&tone),
        tone
    )
}

fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Style directive for the styled variants. The description is inserted verbatim.
pub fn style_directive(style_profile: &str) -> String {
    format!(
        "Write the reply exactly the way I write. Emulate the writing style described below \
         (word choice, length, punctuation, emoji use, capitalization):\n\
         <writing_style>\n{style_profile}\n</writing_style>"
    )
}

/// Language rules. `device_language` is the fallback when there is no context.
pub fn language_directive(has_context: bool, device_language: &str) -> String {
    let primary = if has_context {
        "Reply in the same language I used in my note at the end.".to_string()
    } else {
        format!("Reply in {device_language}.")
    };
    format!(
        "Language: {primary} If I explicitly ask for a specific language, \
         use that language instead. Never switch languages just because the screenshot is \
         written in another language."
    )
}

pub fn contact_notes_block(notes: &str) -> String {
    format!(
        "Things you must remember about this person:\n\
         <contact_notes>\n{notes}\n</contact_notes>"
    )
}

pub fn context_block(context: &str) -> String {
    format!("Additional context from me:\n<context>\n{context}\n</context>")
}

pub fn closing_instruction(multi_image: bool) -> &'static str {
    if multi_image {
        "Analyze the screenshots now and write my reply."
    } else {
        "Analyze the screenshot now and write my reply."
    }
}

/// Prompt for turning writing samples into a style description.
///
/// Blank samples are skipped; the remaining ones are numbered in order.
pub fn build_style_analysis_message(samples: &[String]) -> String {
    let mut listed = String::new();
    let mut n = 0;
    for sample in samples.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        n += 1;
        listed.push_str(&format!("<sample index=\"{n}\">\n{sample}\n</sample>\n"));
    }
    format!(
        "Below are messages I wrote to people. Describe my personal texting style so that \
         another writer could imitate it: typical message length, vocabulary, slang, \
         punctuation, capitalization, emoji usage, humor, and how direct I am.\n\
         Respond with ONLY the description, in plain sentences, under 120 words. \
         Do not quote the samples.\n\n\
         <samples>\n{listed}</samples>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_directive_lowercases() {
        let text = tone_directive("Best Friend", "Professional");
        assert!(text.contains("my best friend"));
        assert!(text.contains("in a professional tone."));
    }

    #[test]
    fn tone_directive_uses_an_before_vowels() {
        assert!(tone_directive("Ex", "Apologetic").contains("in an apologetic tone."));
        assert!(tone_directive("Boss", "Polite").contains("in a polite tone."));
    }

    #[test]
    fn language_directive_prefers_context() {
        let with = language_directive(true, "English");
        assert!(with.contains("same language I used in my note"));
        assert!(!with.contains("Reply in English"));

        let without = language_directive(false, "German");
        assert!(without.contains("Reply in German."));
        assert!(without.contains("Never switch languages"));
    }

    #[test]
    fn style_analysis_skips_blank_samples() {
        let samples = vec![
            "hey whats up".to_string(),
            "   ".to_string(),
            "lol ok see u then".to_string(),
        ];
        let message = build_style_analysis_message(&samples);
        assert!(message.contains("<sample index=\"1\">\nhey whats up"));
        assert!(message.contains("<sample index=\"2\">\nlol ok see u then"));
        assert!(!message.contains("index=\"3\""));
    }
}
