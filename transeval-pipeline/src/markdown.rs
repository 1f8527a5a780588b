use transeval_core::model::{ConstraintRecord, State};

/// Canonical markdown rendering of a constraint record for prompt templates
/// (§4.6): one field per line, then the glossary and banned-patterns lists.
pub fn constraints_markdown(constraints: &ConstraintRecord) -> String {
    let mut lines = Vec::new();
    lines.push(format!("- target language: {}", constraints.target_lang));
    if let Some(tone) = &constraints.tone {
        lines.push(format!("- tone: {tone}"));
    }
    if let Some(register) = &constraints.register {
        lines.push(format!("- register: {register}"));
    }
    if let Some(reading_level) = &constraints.reading_level {
        lines.push(format!("- reading level: {reading_level}"));
    }
    lines.push(format!(
        "- keep line breaks: {}",
        constraints.format.keep_line_breaks.unwrap_or(false)
    ));
    if let Some(max_chars) = constraints.format.max_chars {
        lines.push(format!("- max chars: {max_chars}"));
    }
    lines.push(format!(
        "- no extra prefix/suffix: {}",
        constraints.format.no_extra_prefix_suffix.unwrap_or(false)
    ));

    if !constraints.glossary.is_empty() {
        lines.push("- glossary:".to_string());
        for entry in &constraints.glossary {
            let strict = if entry.strict { " (strict)" } else { "" };
            lines.push(format!("  - {} -> {}{strict}", entry.ja, entry.en));
        }
    }
    if !constraints.banned_patterns.is_empty() {
        lines.push("- banned patterns:".to_string());
        for pattern in &constraints.banned_patterns {
            lines.push(format!("  - {pattern}"));
        }
    }

    lines.join("\n")
}

/// Pretty-printed JSON for a [`State`], or the literal `"not provided"` when
/// absent (§4.6).
pub fn state_or_not_provided(state: Option<&State>) -> String {
    match state {
        None => "not provided".to_string(),
        Some(state) => serde_json::to_string_pretty(state).unwrap_or_else(|_| "not provided".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transeval_core::model::{FormatSettings, GlossaryEntry};

    #[test]
    fn renders_glossary_and_banned_patterns() {
        let constraints = ConstraintRecord {
            target_lang: "en".to_string(),
            tone: Some("formal".to_string()),
            register: None,
            reading_level: None,
            format: FormatSettings::default(),
            glossary: vec![GlossaryEntry {
                ja: "鍵".to_string(),
                en: "Key".to_string(),
                strict: true,
            }],
            banned_patterns: vec!["foo".to_string()],
            allow_japanese_tokens: vec![],
        };
        let rendered = constraints_markdown(&constraints);
        assert!(rendered.contains("target language: en"));
        assert!(rendered.contains("鍵 -> Key (strict)"));
        assert!(rendered.contains("- foo"));
    }

    #[test]
    fn absent_state_renders_not_provided() {
        assert_eq!(state_or_not_provided(None), "not provided");
    }
}
