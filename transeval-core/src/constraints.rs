use crate::error::{CoreError, Result};
use crate::model::{ConstraintPartial, ConstraintRecord, FormatSettings};
use regex::Regex;

/// Merges a defaults partial and a per-sample partial into a fully populated
/// [`ConstraintRecord`] (§4.1). Sample values win on scalar/format fields;
/// list fields are concatenated defaults-first.
pub fn normalize(defaults: &ConstraintPartial, sample: &ConstraintPartial) -> Result<ConstraintRecord> {
    let target_lang = sample
        .target_lang
        .clone()
        .or_else(|| defaults.target_lang.clone())
        .unwrap_or_else(|| "en".to_string());

    let tone = sample.tone.clone().or_else(|| defaults.tone.clone());
    let register = sample.register.clone().or_else(|| defaults.register.clone());
    let reading_level = sample
        .reading_level
        .clone()
        .or_else(|| defaults.reading_level.clone());

    let format = merge_format(defaults.format.as_ref(), sample.format.as_ref());

    let mut glossary = defaults.glossary.clone();
    glossary.extend(sample.glossary.clone());

    let mut banned_patterns = defaults.banned_patterns.clone();
    banned_patterns.extend(sample.banned_patterns.clone());

    let mut allow_japanese_tokens = defaults.allow_japanese_tokens.clone();
    allow_japanese_tokens.extend(sample.allow_japanese_tokens.clone());

    validate(&format, &banned_patterns)?;

    Ok(ConstraintRecord {
        target_lang,
        tone,
        register,
        reading_level,
        format,
        glossary,
        banned_patterns,
        allow_japanese_tokens,
    })
}

fn merge_format(defaults: Option<&FormatSettings>, sample: Option<&FormatSettings>) -> FormatSettings {
    let base = defaults.cloned().unwrap_or_default();
    match sample {
        None => base,
        Some(over) => FormatSettings {
            keep_line_breaks: over.keep_line_breaks.or(base.keep_line_breaks),
            max_chars: over.max_chars.or(base.max_chars),
            no_extra_prefix_suffix: over.no_extra_prefix_suffix.or(base.no_extra_prefix_suffix),
        },
    }
}

fn validate(format: &FormatSettings, banned_patterns: &[String]) -> Result<()> {
    if let Some(max_chars) = format.max_chars {
        if max_chars < 0 {
            return Err(CoreError::Validation(format!(
                "format.maxChars must be non-negative, got {max_chars}"
            )));
        }
    }
    for pattern in banned_patterns {
        Regex::new(pattern).map_err(|e| {
            CoreError::Validation(format!("bannedPatterns entry {pattern:?} is not a valid regex: {e}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GlossaryEntry;

    #[test]
    fn scalar_fields_sample_wins() {
        let defaults = ConstraintPartial {
            tone: Some("formal".into()),
            ..Default::default()
        };
        let sample = ConstraintPartial {
            tone: Some("casual".into()),
            ..Default::default()
        };
        let merged = normalize(&defaults, &sample).unwrap();
        assert_eq!(merged.tone.as_deref(), Some("casual"));
    }

    #[test]
    fn target_lang_defaults_to_en() {
        let merged = normalize(&ConstraintPartial::default(), &ConstraintPartial::default()).unwrap();
        assert_eq!(merged.target_lang, "en");
    }

    #[test]
    fn format_shallow_merge_sample_overrides() {
        let defaults = ConstraintPartial {
            format: Some(FormatSettings {
                keep_line_breaks: Some(true),
                max_chars: Some(100),
                no_extra_prefix_suffix: Some(false),
            }),
            ..Default::default()
        };
        let sample = ConstraintPartial {
            format: Some(FormatSettings {
                keep_line_breaks: Some(false),
                max_chars: Some(40),
                no_extra_prefix_suffix: Some(true),
            }),
            ..Default::default()
        };
        let merged = normalize(&defaults, &sample).unwrap();
        assert_eq!(merged.format.max_chars, Some(40));
        assert_eq!(merged.format.keep_line_breaks, Some(false));
        assert_eq!(merged.format.no_extra_prefix_suffix, Some(true));
    }

    #[test]
    fn format_field_absent_from_sample_falls_back_to_default() {
        let defaults = ConstraintPartial {
            format: Some(FormatSettings {
                keep_line_breaks: Some(true),
                max_chars: None,
                no_extra_prefix_suffix: None,
            }),
            ..Default::default()
        };
        let sample = ConstraintPartial {
            format: Some(FormatSettings {
                keep_line_breaks: None,
                max_chars: Some(40),
                no_extra_prefix_suffix: None,
            }),
            ..Default::default()
        };
        let merged = normalize(&defaults, &sample).unwrap();
        assert_eq!(merged.format.keep_line_breaks, Some(true));
        assert_eq!(merged.format.max_chars, Some(40));
    }

    #[test]
    fn list_fields_concatenate_defaults_first() {
        let defaults = ConstraintPartial {
            glossary: vec![GlossaryEntry {
                ja: "鍵".into(),
                en: "Key".into(),
                strict: true,
            }],
            ..Default::default()
        };
        let sample = ConstraintPartial {
            glossary: vec![GlossaryEntry {
                ja: "扉".into(),
                en: "Door".into(),
                strict: false,
            }],
            ..Default::default()
        };
        let merged = normalize(&defaults, &sample).unwrap();
        assert_eq!(merged.glossary.len(), 2);
        assert_eq!(merged.glossary[0].en, "Key");
        assert_eq!(merged.glossary[1].en, "Door");
    }

    #[test]
    fn negative_max_chars_rejected() {
        let sample = ConstraintPartial {
            format: Some(FormatSettings {
                max_chars: Some(-5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = normalize(&ConstraintPartial::default(), &sample).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn non_regex_banned_pattern_rejected() {
        let sample = ConstraintPartial {
            banned_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let err = normalize(&ConstraintPartial::default(), &sample).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
