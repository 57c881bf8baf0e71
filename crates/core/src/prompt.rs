//! Prompt composition for translate jobs.

use crate::project::GlossaryTerm;

/// Build the full generator prompt for one chapter.
///
/// ```text
/// {instructions}
///
/// Glossary:
/// {original} = {translation}
/// ...
///
/// Text:
/// {source}
/// ```
///
/// The glossary block is omitted when the glossary is empty.
pub fn compose_translation_prompt(instructions: &str, glossary: &[GlossaryTerm], source: &str) -> String {
    let mut prompt = String::with_capacity(instructions.len() + source.len() + 64);
    prompt.push_str(instructions.trim_end());

    if !glossary.is_empty() {
        prompt.push_str("\n\nGlossary:\n");
        let lines: Vec<String> = glossary
            .iter()
            .map(|term| format!("{} = {}", term.original, term.translation))
            .collect();
        prompt.push_str(&lines.join("\n"));
    }

    prompt.push_str("\n\nText:\n");
    prompt.push_str(source);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_glossary_lines() {
        let glossary = vec![
            GlossaryTerm {
                original: "灵气".into(),
                translation: "qi".into(),
            },
            GlossaryTerm {
                original: "宗门".into(),
                translation: "sect".into(),
            },
        ];
        let prompt = compose_translation_prompt("Translate to English.\n", &glossary, "正文");
        assert_eq!(
            prompt,
            "Translate to English.\n\nGlossary:\n灵气 = qi\n宗门 = sect\n\nText:\n正文"
        );
    }

    #[test]
    fn empty_glossary_is_omitted() {
        let prompt = compose_translation_prompt("Translate.", &[], "body");
        assert_eq!(prompt, "Translate.\n\nText:\nbody");
    }
}
