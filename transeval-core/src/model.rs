use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One translatable unit inside a [`Scene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    Narration,
    Dialogue,
    Sfx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub t: i64,
    pub kind: SegmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
}

/// A single glossary entry; `strict` entries must appear verbatim in `final.en`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryEntry {
    pub ja: String,
    pub en: String,
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_line_breaks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_extra_prefix_suffix: Option<bool>,
}

/// Partial constraint document as it appears in config defaults, a scene, or a
/// dataset row. Every field is optional; [`crate::constraints::normalize`]
/// merges two of these into a fully populated [`ConstraintRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintPartial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatSettings>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
    #[serde(default)]
    pub banned_patterns: Vec<String>,
    #[serde(default)]
    pub allow_japanese_tokens: Vec<String>,
}

/// Fully populated constraint record, the output of the normalizer (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRecord {
    pub target_lang: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_level: Option<String>,
    pub format: FormatSettings,
    pub glossary: Vec<GlossaryEntry>,
    pub banned_patterns: Vec<String>,
    pub allow_japanese_tokens: Vec<String>,
}

/// A narrative unit bundling segments, state, and constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub scene_id: String,
    pub lang_src: String,
    pub lang_tgt: String,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub world_state: serde_json::Value,
    #[serde(default)]
    pub character_state: serde_json::Value,
    #[serde(default)]
    pub constraints: ConstraintPartial,
    #[serde(default)]
    pub eval_targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A row from the dataset JSONL input (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetJa {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReference {
    pub en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub ja: DatasetJa,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintPartial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<DatasetReference>,
}

/// One `(scene, segment)` pairing presented to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub sample_id: String,
    pub source_text: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub constraints: ConstraintPartial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_en: Option<String>,
}

/// Extracted narrative facts fed to the stateful translator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub desc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub utterance: String,
    pub speaker: String,
    pub addressee: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    pub core_meaning: String,
    pub implicature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Mistranslation,
    Omission,
    Addition,
    TermInconsistency,
    PronounReference,
    SpeakerMismatch,
    StyleViolation,
    FormatViolation,
    SafetyOrPolicy,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub rationale: String,
    pub fix_suggestion: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardCheckResult {
    pub id: String,
    pub passed: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub adequacy: f64,
    pub fluency: f64,
    pub constraint_compliance: f64,
    pub style_fit: f64,
    pub overall: f64,
}

/// Pipeline variant selector. See [`crate::condition::capability_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    A0,
    A1,
    A2,
    A3,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Condition::A0 => "A0",
            Condition::A1 => "A1",
            Condition::A2 => "A2",
            Condition::A3 => "A3",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl UsageTotals {
    pub fn add(&mut self, other: UsageTotals) {
        self.prompt += other.prompt;
        self.completion += other.completion;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    /// Stage name -> accumulated milliseconds (repair loop passes accumulate).
    pub stages: HashMap<String, u64>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    NeedsReview,
    Error,
}

/// Full artifact for one `(sample, condition)` pair; appended once to the JSONL sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: String,
    pub condition: Condition,
    pub sample_id: String,
    pub draft: String,
    #[serde(rename = "final")]
    pub final_translation: String,
    pub issues: Vec<Issue>,
    pub hard_checks: Vec<HardCheckResult>,
    pub scores: ScoreBreakdown,
    pub usage: UsageTotals,
    pub timings: Timings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    pub normalized_constraints: ConstraintRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<serde_json::Value>,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub config: serde_json::Value,
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub scene_filter: SceneFilter,
    pub status: ExperimentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_record_uses_camel_case_keys_on_wire() {
        let record = RunRecord {
            run_id: "r1".to_string(),
            condition: Condition::A0,
            sample_id: "s1:0".to_string(),
            draft: "draft".to_string(),
            final_translation: "final".to_string(),
            issues: vec![],
            hard_checks: vec![],
            scores: ScoreBreakdown::default(),
            usage: UsageTotals::default(),
            timings: Timings::default(),
            state: None,
            normalized_constraints: ConstraintRecord {
                target_lang: "en".to_string(),
                tone: None,
                register: None,
                reading_level: None,
                format: FormatSettings::default(),
                glossary: vec![],
                banned_patterns: vec![],
                allow_japanese_tokens: vec![],
            },
            trace: None,
            status: RunStatus::Ok,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["runId"], "r1");
        assert_eq!(json["sampleId"], "s1:0");
        assert_eq!(json["final"], "final");
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn usage_totals_add_accumulates() {
        let mut total = UsageTotals::default();
        total.add(UsageTotals {
            prompt: 10,
            completion: 5,
            total: 15,
        });
        total.add(UsageTotals {
            prompt: 2,
            completion: 1,
            total: 3,
        });
        assert_eq!(total.prompt, 12);
        assert_eq!(total.completion, 6);
        assert_eq!(total.total, 18);
    }

    #[test]
    fn condition_display_matches_wire_names() {
        assert_eq!(Condition::A0.to_string(), "A0");
        assert_eq!(Condition::A3.to_string(), "A3");
    }
}
