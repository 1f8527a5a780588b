use crate::model::ConstraintPartial;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The configuration document (§6.3), loaded from YAML or JSON by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub run_settings: RunSettings,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub components: ComponentsConfig,
    #[serde(default)]
    pub prompt_artifacts: HashMap<String, String>,
    #[serde(default)]
    pub langfuse: LangfuseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm: Option<u32>,
    #[serde(default = "default_max_repairs")]
    pub max_repairs: u32,
    #[serde(default = "default_judge_runs")]
    pub judge_runs: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_resolved_prompt_dir")]
    pub resolved_prompt_dir: String,
}

fn default_concurrency() -> usize {
    2
}
fn default_max_repairs() -> u32 {
    1
}
fn default_judge_runs() -> u32 {
    3
}
fn default_output_dir() -> String {
    "output".to_string()
}
fn default_cache_dir() -> String {
    "cache".to_string()
}
fn default_resolved_prompt_dir() -> String {
    "resolved-prompts".to_string()
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            concurrency: default_concurrency(),
            rpm: None,
            tpm: None,
            max_repairs: default_max_repairs(),
            judge_runs: default_judge_runs(),
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            resolved_prompt_dir: default_resolved_prompt_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsConfig {
    #[serde(default)]
    pub constraints: ConstraintPartial,
    #[serde(default)]
    pub hard_checks: HardChecksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardChecksConfig {
    #[serde(default = "default_true")]
    pub no_disallowed_japanese: bool,
    #[serde(default = "default_true")]
    pub glossary_strict_matches: bool,
    #[serde(default = "default_true")]
    pub no_meta_talk: bool,
    #[serde(default = "default_true")]
    pub format_preserved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Default for HardChecksConfig {
    fn default() -> Self {
        HardChecksConfig {
            no_disallowed_japanese: true,
            glossary_strict_matches: true,
            no_meta_talk: true,
            format_preserved: true,
            max_length: None,
        }
    }
}

impl From<&HardChecksConfig> for crate::hardcheck::HardCheckSettings {
    fn from(c: &HardChecksConfig) -> Self {
        crate::hardcheck::HardCheckSettings {
            no_disallowed_japanese: c.no_disallowed_japanese,
            glossary_strict_matches: c.glossary_strict_matches,
            no_meta_talk: c.no_meta_talk,
            format_preserved: c.format_preserved,
            max_length: c.max_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    Openai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub name: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub json_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum PromptSpec {
    Template { template: String },
    File { file: String },
    Artifact {
        artifact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact_field: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub model: ModelSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptSpec>,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_with_state: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_builder: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repairer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<ComponentSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LangfuseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LangfuseConfig {
    fn default() -> Self {
        LangfuseConfig {
            enabled: false,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_settings_defaults_match_spec() {
        let rs = RunSettings::default();
        assert_eq!(rs.concurrency, 2);
        assert_eq!(rs.max_repairs, 1);
        assert_eq!(rs.judge_runs, 3);
    }

    #[test]
    fn parses_minimal_yaml_document() {
        let yaml = r#"
runSettings:
  concurrency: 4
components:
  translator:
    model:
      provider: mock
      name: mock-1
"#;
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.run_settings.concurrency, 4);
        assert!(cfg.components.translator.is_some());
    }
}
