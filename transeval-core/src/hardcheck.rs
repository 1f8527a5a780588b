use crate::model::{ConstraintRecord, HardCheckResult, Issue, IssueType, Severity};
use regex::Regex;
use std::sync::OnceLock;

/// Per-run toggles for the hard-check rules (§4.2), sourced from
/// `defaults.hardChecks` in the configuration document (§6.3).
#[derive(Debug, Clone)]
pub struct HardCheckSettings {
    pub no_disallowed_japanese: bool,
    pub glossary_strict_matches: bool,
    pub no_meta_talk: bool,
    pub format_preserved: bool,
    pub max_length: Option<i64>,
}

impl Default for HardCheckSettings {
    fn default() -> Self {
        HardCheckSettings {
            no_disallowed_japanese: true,
            glossary_strict_matches: true,
            no_meta_talk: true,
            format_preserved: true,
            max_length: None,
        }
    }
}

fn meta_talk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)as an ai").expect("static regex is valid"))
}

fn contains_cjk(token: &str) -> bool {
    token.chars().any(|c| {
        let cp = c as u32;
        (0x3040..=0x309F).contains(&cp) // Hiragana
            || (0x30A0..=0x30FF).contains(&cp) // Katakana
            || (0x4E00..=0x9FFF).contains(&cp) // CJK Unified Ideographs
    })
}

/// Runs every togglable rule over `translation` and returns the ordered list
/// of [`HardCheckResult`]s exactly as §4.2 enumerates them.
pub fn run_checks(
    constraints: &ConstraintRecord,
    settings: &HardCheckSettings,
    translation: &str,
    source: &str,
) -> Vec<HardCheckResult> {
    let mut results = Vec::with_capacity(5);

    if settings.no_disallowed_japanese {
        results.push(check_no_disallowed_japanese(constraints, translation));
    }
    if settings.glossary_strict_matches {
        results.push(check_glossary_strict_matches(constraints, translation));
    }
    results.push(check_max_length(constraints, settings, translation));
    if settings.no_meta_talk {
        results.push(check_no_meta_talk(translation));
    }
    if settings.format_preserved {
        results.push(check_format_preserved(constraints, translation, source));
    }

    results
}

fn check_no_disallowed_japanese(constraints: &ConstraintRecord, translation: &str) -> HardCheckResult {
    let offending: Vec<&str> = translation
        .split_whitespace()
        .filter(|tok| contains_cjk(tok) && !constraints.allow_japanese_tokens.iter().any(|t| t == tok))
        .collect();
    HardCheckResult {
        id: "noDisallowedJapanese".to_string(),
        passed: offending.is_empty(),
        description: "translation contains no disallowed CJK tokens".to_string(),
        details: if offending.is_empty() {
            None
        } else {
            Some(format!("disallowed tokens: {}", offending.join(", ")))
        },
    }
}

fn check_glossary_strict_matches(constraints: &ConstraintRecord, translation: &str) -> HardCheckResult {
    let missing: Vec<&str> = constraints
        .glossary
        .iter()
        .filter(|g| g.strict && !translation.contains(&g.en))
        .map(|g| g.en.as_str())
        .collect();
    HardCheckResult {
        id: "glossaryStrictMatches".to_string(),
        passed: missing.is_empty(),
        description: "every strict glossary entry appears in the translation".to_string(),
        details: if missing.is_empty() {
            None
        } else {
            Some(format!("missing strict terms: {}", missing.join(", ")))
        },
    }
}

fn check_max_length(constraints: &ConstraintRecord, settings: &HardCheckSettings, translation: &str) -> HardCheckResult {
    let bound = match (constraints.format.max_chars, settings.max_length) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    let len = translation.chars().count() as i64;
    let passed = match bound {
        Some(limit) => len <= limit,
        None => true,
    };
    HardCheckResult {
        id: "maxLength".to_string(),
        passed,
        description: "translation length is within the configured bound".to_string(),
        details: bound.map(|limit| format!("len={len}, limit={limit}")),
    }
}

fn check_no_meta_talk(translation: &str) -> HardCheckResult {
    let passed = !meta_talk_regex().is_match(translation);
    HardCheckResult {
        id: "noMetaTalk".to_string(),
        passed,
        description: "translation does not contain meta-commentary about being an AI".to_string(),
        details: if passed {
            None
        } else {
            Some("matched pattern: as an ai".to_string())
        },
    }
}

fn check_format_preserved(constraints: &ConstraintRecord, translation: &str, source: &str) -> HardCheckResult {
    if !constraints.format.keep_line_breaks.unwrap_or(false) {
        return HardCheckResult {
            id: "formatPreserved".to_string(),
            passed: true,
            description: "line break preservation is not required".to_string(),
            details: None,
        };
    }
    let translation_breaks = translation.matches('\n').count();
    let source_breaks = source.matches('\n').count();
    let passed = translation_breaks == source_breaks;
    HardCheckResult {
        id: "formatPreserved".to_string(),
        passed,
        description: "translation preserves the source's line break count".to_string(),
        details: if passed {
            None
        } else {
            Some(format!(
                "translation has {translation_breaks} line breaks, source has {source_breaks}"
            ))
        },
    }
}

/// Synthesizes one [`Issue`] per failing [`HardCheckResult`] (§4.2).
pub fn issues_from_hard_checks(results: &[HardCheckResult]) -> Vec<Issue> {
    results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| {
            let (issue_type, severity) = match r.id.as_str() {
                "formatPreserved" => (IssueType::FormatViolation, Severity::Minor),
                "noDisallowedJapanese" => (IssueType::StyleViolation, Severity::Major),
                _ => (IssueType::StyleViolation, Severity::Minor),
            };
            Issue {
                id: format!("hardcheck:{}", r.id),
                issue_type,
                severity,
                rationale: r.description.clone(),
                fix_suggestion: format!("revise the translation so that {} passes", r.id),
                confidence: 0.8,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FormatSettings, GlossaryEntry};

    fn constraints() -> ConstraintRecord {
        ConstraintRecord {
            target_lang: "en".to_string(),
            tone: None,
            register: None,
            reading_level: None,
            format: FormatSettings::default(),
            glossary: vec![],
            banned_patterns: vec![],
            allow_japanese_tokens: vec![],
        }
    }

    #[test]
    fn detects_disallowed_japanese() {
        let c = constraints();
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "こんにちは, 世界.", "source");
        let hc = results.iter().find(|r| r.id == "noDisallowedJapanese").unwrap();
        assert!(!hc.passed);
    }

    #[test]
    fn allow_japanese_tokens_are_exempt() {
        let mut c = constraints();
        c.allow_japanese_tokens.push("世界".to_string());
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "世界", "source");
        let hc = results.iter().find(|r| r.id == "noDisallowedJapanese").unwrap();
        assert!(hc.passed);
    }

    #[test]
    fn glossary_strict_missing_term_fails() {
        let mut c = constraints();
        c.glossary.push(GlossaryEntry {
            ja: "鍵".to_string(),
            en: "Key".to_string(),
            strict: true,
        });
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "鍵はここ.", "鍵はここ。");
        let hc = results.iter().find(|r| r.id == "glossaryStrictMatches").unwrap();
        assert!(!hc.passed);
    }

    #[test]
    fn max_length_takes_tighter_of_both_bounds() {
        let mut c = constraints();
        c.format.max_chars = Some(100);
        let mut settings = HardCheckSettings::default();
        settings.max_length = Some(5);
        let results = run_checks(&c, &settings, "0123456789", "source");
        let hc = results.iter().find(|r| r.id == "maxLength").unwrap();
        assert!(!hc.passed);
    }

    #[test]
    fn no_meta_talk_is_case_insensitive() {
        let c = constraints();
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "As an AI, I cannot.", "source");
        let hc = results.iter().find(|r| r.id == "noMetaTalk").unwrap();
        assert!(!hc.passed);
    }

    #[test]
    fn format_preserved_checks_line_break_parity() {
        let mut c = constraints();
        c.format.keep_line_breaks = Some(true);
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "one\ntwo", "one\ntwo\nthree");
        let hc = results.iter().find(|r| r.id == "formatPreserved").unwrap();
        assert!(!hc.passed);
    }

    #[test]
    fn format_preserved_skipped_when_not_required() {
        let c = constraints();
        let settings = HardCheckSettings::default();
        let results = run_checks(&c, &settings, "one\ntwo", "one\ntwo\nthree");
        let hc = results.iter().find(|r| r.id == "formatPreserved").unwrap();
        assert!(hc.passed);
    }

    #[test]
    fn disabled_rule_is_not_run() {
        let c = constraints();
        let mut settings = HardCheckSettings::default();
        settings.no_meta_talk = false;
        let results = run_checks(&c, &settings, "As an AI, I cannot.", "source");
        assert!(!results.iter().any(|r| r.id == "noMetaTalk"));
    }

    #[test]
    fn issue_synthesis_maps_ids_to_type_and_severity() {
        let results = vec![
            HardCheckResult {
                id: "formatPreserved".to_string(),
                passed: false,
                description: "d".to_string(),
                details: None,
            },
            HardCheckResult {
                id: "noDisallowedJapanese".to_string(),
                passed: false,
                description: "d".to_string(),
                details: None,
            },
            HardCheckResult {
                id: "noMetaTalk".to_string(),
                passed: false,
                description: "d".to_string(),
                details: None,
            },
        ];
        let issues = issues_from_hard_checks(&results);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].issue_type, IssueType::FormatViolation);
        assert_eq!(issues[0].severity, Severity::Minor);
        assert_eq!(issues[1].severity, Severity::Major);
        assert_eq!(issues[2].severity, Severity::Minor);
    }
}
